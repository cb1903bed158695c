// ── Device-type definitions ──
//
// Builds the catalog definition for a node whose type mapping key is not
// known to the catalog yet.

use tracing::warn;

use zwdc_api::catalog::models::SERIALIZATION_JSON;
use zwdc_api::{
    Attribute, Content, ContentVariable, DeviceType, Interaction, Service, variable_type,
};

use crate::devicetypes::{ATTRIBUTE_TYPE_MAPPING_KEY, ATTRIBUTE_USED_FOR_ZWAVE};
use crate::model::{DeviceInfo, NodeValue, STATISTICS_SERVICE};

/// Catalog references stamped into generated definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionSettings {
    pub device_class_id: String,
    pub protocol_id: String,
    pub protocol_segment_id: String,
    pub last_update_function_id: String,
    pub last_update_characteristic_id: String,
}

/// Statistics counters reported per node.
const STATISTICS_FIELDS: [&str; 6] = [
    "commandsTX",
    "commandsRX",
    "commandsDroppedRX",
    "commandsDroppedTX",
    "timeoutResponse",
    "rtt",
];

/// Catalog variable type for a controller value type, or `None` when the
/// type has no catalog counterpart.
pub fn catalog_value_type(value_type: &str) -> Option<&'static str> {
    match value_type.to_lowercase().as_str() {
        "number" | "float" | "float64" | "float32" | "float16" | "double" | "double64"
        | "double32" | "int" | "integer" | "int64" | "int32" | "duration" => {
            Some(variable_type::FLOAT)
        }
        "text" | "string" => Some(variable_type::TEXT),
        "bool" | "boolean" | "binary" => Some(variable_type::BOOLEAN),
        _ => None,
    }
}

/// Definition for `node`: one statistics event service, plus a read
/// service per readable value and a set service per writable value.
/// Values of unknown type are skipped.
pub fn build_definition(node: &DeviceInfo, settings: &DefinitionSettings) -> DeviceType {
    let mut services = vec![statistics_service(settings)];

    for value in node.values.values() {
        let Some(value_type) = catalog_value_type(&value.value_type) else {
            warn!(
                value_type = %value.value_type,
                value_id = %value.value_id,
                "unknown value type, skipping service"
            );
            continue;
        };
        if !value.write_only {
            services.push(read_service(value, value_type, settings));
        }
        if !value.read_only {
            services.push(set_service(value, value_type, settings));
        }
    }

    DeviceType {
        name: format!("ZWaveJs2Mqtt {} {}", node.manufacturer, node.product),
        device_class_id: settings.device_class_id.clone(),
        attributes: vec![
            Attribute::new(ATTRIBUTE_USED_FOR_ZWAVE, "true"),
            Attribute::new(ATTRIBUTE_TYPE_MAPPING_KEY, node.type_mapping_key()),
        ],
        services,
        ..DeviceType::default()
    }
}

fn json_content(variable: ContentVariable, settings: &DefinitionSettings) -> Content {
    Content {
        content_variable: variable,
        serialization: SERIALIZATION_JSON.into(),
        protocol_segment_id: settings.protocol_segment_id.clone(),
        ..Content::default()
    }
}

fn statistics_service(settings: &DefinitionSettings) -> Service {
    let statistics = ContentVariable {
        sub_content_variables: STATISTICS_FIELDS
            .iter()
            .map(|name| ContentVariable::new(*name, variable_type::FLOAT))
            .collect(),
        ..ContentVariable::new(STATISTICS_SERVICE, variable_type::STRUCTURE)
    };
    Service {
        local_id: STATISTICS_SERVICE.into(),
        name: STATISTICS_SERVICE.into(),
        interaction: Interaction::Event,
        protocol_id: settings.protocol_id.clone(),
        outputs: vec![json_content(statistics, settings)],
        ..Service::default()
    }
}

fn read_service(value: &NodeValue, value_type: &str, settings: &DefinitionSettings) -> Service {
    let output = ContentVariable {
        sub_content_variables: vec![
            ContentVariable::new("value", value_type),
            ContentVariable {
                function_id: settings.last_update_function_id.clone(),
                characteristic_id: settings.last_update_characteristic_id.clone(),
                ..ContentVariable::new("lastUpdate", variable_type::INTEGER)
            },
            ContentVariable {
                unit_reference: "value".into(),
                ..ContentVariable::new("value_unit", variable_type::TEXT)
            },
            ContentVariable {
                unit_reference: "lastUpdate".into(),
                ..ContentVariable::new("lastUpdate_unit", variable_type::TEXT)
            },
        ],
        ..ContentVariable::new("value", variable_type::STRUCTURE)
    };
    Service {
        local_id: value.service_id(true),
        name: value.label.clone(),
        interaction: Interaction::EventAndRequest,
        protocol_id: settings.protocol_id.clone(),
        outputs: vec![json_content(output, settings)],
        ..Service::default()
    }
}

fn set_service(value: &NodeValue, value_type: &str, settings: &DefinitionSettings) -> Service {
    Service {
        local_id: value.service_id(false),
        name: value.label.clone(),
        interaction: Interaction::EventAndRequest,
        protocol_id: settings.protocol_id.clone(),
        inputs: vec![json_content(
            ContentVariable::new("value", value_type),
            settings,
        )],
        ..Service::default()
    }
}
