//! Tool descriptors from the provider, reshaped for the model API.

use crate::domain::ToolDescriptor;
use crate::model::ModelToolSpec;

pub fn to_model_tools(descriptors: &[ToolDescriptor]) -> Vec<ModelToolSpec> {
    descriptors
        .iter()
        .map(|descriptor| ModelToolSpec {
            name: descriptor.name.clone(),
            description: descriptor.description.clone().unwrap_or_default(),
            input_schema: descriptor.input_schema.clone(),
        })
        .collect()
}
