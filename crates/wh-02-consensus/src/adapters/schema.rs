//! Structural schema check: the data is a JSON object naming its object and
//! action. Full JSON-schema validation is the dispatcher's concern.

use crate::ports::SchemaValidator;
use serde_json::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralSchemaValidator;

impl SchemaValidator for StructuralSchemaValidator {
    fn verify_data(&self, data: &[u8]) -> Result<(), String> {
        let value: Value = serde_json::from_slice(data).map_err(|e| e.to_string())?;
        let object = value
            .as_object()
            .ok_or_else(|| "data is not a JSON object".to_string())?;

        for field in ["object", "action"] {
            match object.get(field) {
                Some(Value::String(_)) => {}
                Some(_) => return Err(format!("field `{field}` is not a string")),
                None => return Err(format!("missing field `{field}`")),
            }
        }
        Ok(())
    }
}
