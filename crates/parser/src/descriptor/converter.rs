//! Converts protobuf descriptors to the intermediate model

use crate::model::{self, FileFacts, WIRE_TYPE_KEYWORDS};
use protoscaffold_common::{naming, GeneratorError, MessageDefinition, Result, ServiceDefinition};
use prost_reflect::{DescriptorPool, FieldDescriptor, MessageDescriptor};

const TYPE_GROUP: i32 = 10;
const TYPE_MESSAGE: i32 = 11;
const TYPE_ENUM: i32 = 14;

/// Keyword for a declared field type code, `"unknown"` outside the table
pub fn wire_type_keyword(code: i32) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|c| c.checked_sub(1))
        .and_then(|i| WIRE_TYPE_KEYWORDS.get(i))
        .copied()
        .unwrap_or("unknown")
}

/// Convert one file of the pool into its services
pub fn convert_file(
    pool: &DescriptorPool,
    file_name: &str,
    source_name: &str,
) -> Result<Vec<ServiceDefinition>> {
    let file = pool.get_file_by_name(file_name).ok_or_else(|| {
        GeneratorError::Descriptor(format!("File {} not found in descriptor pool", file_name))
    })?;

    let proto = file.file_descriptor_proto();
    let mut facts = FileFacts {
        proto_package: file.package_name().to_string(),
        go_package: proto
            .options
            .as_ref()
            .and_then(|o| o.go_package.as_deref())
            .map(naming::go_package_path)
            .unwrap_or_default(),
        import_paths: proto.dependency.clone(),
        ..Default::default()
    };
    tracing::debug!(
        package = %facts.proto_package,
        go_package = %facts.go_package,
        "extracted file facts"
    );

    for message in file.messages() {
        collect_messages(&message, &mut facts.messages);
    }

    for service in file.services() {
        let name = naming::service_or_method_name(service.name());
        tracing::debug!(service = %name, "extracted service");

        let methods = service
            .methods()
            .map(|method| {
                model::build_method(
                    method.name(),
                    method.input().full_name(),
                    method.output().full_name(),
                    method.is_client_streaming(),
                    method.is_server_streaming(),
                )
            })
            .collect();
        facts.services.push((name, methods));
    }

    facts.into_services(source_name)
}

/// Pre-order walk so nested messages follow their parent, as declared
fn collect_messages(message: &MessageDescriptor, out: &mut Vec<MessageDefinition>) {
    if message.is_map_entry() {
        return;
    }

    let mut definition = MessageDefinition::new(naming::to_upper_camel_case(message.name()));
    definition.fields = message
        .fields()
        .filter(is_normal_field)
        .map(|field| {
            model::build_field(
                field.name(),
                &declared_type(&field),
                field.number(),
                field.is_list(),
            )
        })
        .collect();
    out.push(definition);

    // a group's body is a synthesized nested message; it goes with the group
    let group_types: Vec<String> = message
        .fields()
        .filter(|field| field.field_descriptor_proto().r#type == Some(TYPE_GROUP))
        .filter_map(|field| field.field_descriptor_proto().type_name.clone())
        .collect();
    for child in message.child_messages() {
        let full_name = format!(".{}", child.full_name());
        if group_types.contains(&full_name) {
            continue;
        }
        collect_messages(&child, out);
    }
}

/// Map, group and real oneof members are not modeled
fn is_normal_field(field: &FieldDescriptor) -> bool {
    if field.is_map() || field.field_descriptor_proto().r#type == Some(TYPE_GROUP) {
        return false;
    }
    field
        .containing_oneof()
        .map_or(true, |oneof| oneof.is_synthetic())
}

fn declared_type(field: &FieldDescriptor) -> String {
    let proto = field.field_descriptor_proto();
    let code = proto.r#type.unwrap_or(0);
    match proto.type_name.as_deref() {
        Some(type_name)
            if !type_name.is_empty() && matches!(code, 0 | TYPE_MESSAGE | TYPE_ENUM) =>
        {
            type_name.to_string()
        }
        _ => wire_type_keyword(code).to_string(),
    }
}
