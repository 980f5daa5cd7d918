use crate::store::StoreError;

/// Key components are joined with ':' so they must not contain it.
pub(crate) fn validate_component(kind: &str, value: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{kind} must not be empty")));
    }
    if value.len() > 128 {
        return Err(StoreError::Validation(format!(
            "{kind} must be at most 128 characters"
        )));
    }
    if value.contains(':') {
        return Err(StoreError::Validation(format!(
            "{kind} must not contain ':'"
        )));
    }
    Ok(())
}

pub fn practice_item_key(item_id: &str) -> Result<String, StoreError> {
    validate_component("itemId", item_id)?;
    Ok(item_id.to_string())
}

pub fn user_skill_key(user_id: &str, skill_id: &str) -> Result<String, StoreError> {
    validate_component("userId", user_id)?;
    validate_component("skillId", skill_id)?;
    Ok(format!("{}:{}", user_id, skill_id))
}

pub fn user_skill_prefix(user_id: &str) -> Result<String, StoreError> {
    validate_component("userId", user_id)?;
    Ok(format!("{}:", user_id))
}

/// Newest attempts sort first within a user's prefix.
pub fn attempt_key(user_id: &str, timestamp_ms: i64, attempt_id: &str) -> Result<String, StoreError> {
    validate_component("userId", user_id)?;
    validate_component("attemptId", attempt_id)?;
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    Ok(format!("{}:{:020}:{}", user_id, reverse_ts, attempt_id))
}

pub fn attempt_prefix(user_id: &str) -> Result<String, StoreError> {
    validate_component("userId", user_id)?;
    Ok(format!("{}:", user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_key_orders_by_time_desc() {
        let k_new = attempt_key("u1", 2000, "a2").unwrap();
        let k_old = attempt_key("u1", 1000, "a1").unwrap();
        assert!(k_new < k_old);
    }

    #[test]
    fn separator_in_component_is_rejected() {
        assert!(user_skill_key("u:1", "logic").is_err());
        assert!(user_skill_key("u1", "").is_err());
        assert_eq!(user_skill_key("u1", "logic").unwrap(), "u1:logic");
    }
}
