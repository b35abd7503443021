use serde::{Deserialize, Serialize};

use super::{require, require_email, Collection, ValidationError};
use crate::store::id_from_string_or_number;

/// Someone the family shares the tracker with.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    pub relationship: String,
    pub email: String,
    #[serde(default)]
    pub has_access: bool,
}

impl Collection for FamilyMember {
    const KEY: &'static str = "familyMembers";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("relationship", &self.relationship)?;
        require_email("email", &self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grandma() -> FamilyMember {
        FamilyMember {
            id: "f1".to_string(),
            name: "Rosa".to_string(),
            relationship: "Grandmother".to_string(),
            email: "rosa@example.com".to_string(),
            has_access: false,
        }
    }

    #[test]
    fn validation() {
        assert!(grandma().validate().is_ok());

        let cases = [
            ("name", FamilyMember { name: " ".to_string(), ..grandma() }),
            ("relationship", FamilyMember { relationship: String::new(), ..grandma() }),
            ("email", FamilyMember { email: String::new(), ..grandma() }),
            ("email", FamilyMember { email: "rosa-at-example".to_string(), ..grandma() }),
        ];
        for (field, member) in cases {
            assert_eq!(member.validate().map_err(|e| e.field), Err(field));
        }
    }

    #[test]
    fn access_defaults_to_off() -> anyhow::Result<()> {
        let member: FamilyMember = serde_json::from_value(serde_json::json!({
            "id": 1700000000000i64,
            "name": "Rosa",
            "relationship": "Grandmother",
            "email": "rosa@example.com",
        }))?;
        assert_eq!(member.id, "1700000000000");
        assert!(!member.has_access);
        Ok(())
    }
}
