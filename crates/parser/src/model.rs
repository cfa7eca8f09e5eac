//! Strategy-independent pieces of the intermediate model
//!
//! Both extraction strategies collect the same file-level facts and hand
//! RPCs and fields through the same normalization.

use protoscaffold_common::{
    naming, FieldDefinition, GeneratorError, MessageDefinition, MethodDefinition, Result,
    ServiceDefinition, StreamingMode,
};

/// Everything extracted from one schema unit before it is split per service
#[derive(Debug, Default)]
pub(crate) struct FileFacts {
    pub proto_package: String,
    pub go_package: String,
    pub import_paths: Vec<String>,
    pub messages: Vec<MessageDefinition>,
    /// Service name and its methods, in declaration order
    pub services: Vec<(String, Vec<MethodDefinition>)>,
}

impl FileFacts {
    /// One `ServiceDefinition` per declared service, sharing the file-level facts
    pub fn into_services(self, source_name: &str) -> Result<Vec<ServiceDefinition>> {
        if self.services.is_empty() {
            return Err(GeneratorError::NoService(source_name.to_string()));
        }

        let FileFacts {
            proto_package,
            go_package,
            import_paths,
            messages,
            services,
        } = self;

        Ok(services
            .into_iter()
            .map(|(name, methods)| ServiceDefinition {
                name,
                proto_package: proto_package.clone(),
                go_package: go_package.clone(),
                methods,
                messages: messages.clone(),
                import_paths: import_paths.clone(),
            })
            .collect())
    }
}

/// Normalize one RPC into a `MethodDefinition`
pub(crate) fn build_method(
    name: &str,
    request_type: &str,
    response_type: &str,
    request_streams: bool,
    response_streams: bool,
) -> MethodDefinition {
    let name = naming::service_or_method_name(name);
    let request_type_full = strip_leading_dot(request_type).to_string();
    let response_type_full = strip_leading_dot(response_type).to_string();

    let request_bare = naming::clean_type_name(&request_type_full);
    let response_bare = naming::clean_type_name(&response_type_full);
    if !request_bare.ends_with("Request") {
        tracing::warn!(
            method = %name,
            request = %request_bare,
            "request type does not end in \"Request\"; short name left unstripped"
        );
    }
    if !response_bare.ends_with("Reply") {
        tracing::warn!(
            method = %name,
            response = %response_bare,
            "response type does not end in \"Reply\"; short name left unstripped"
        );
    }

    let streaming_mode = StreamingMode::from_flags(request_streams, response_streams);
    tracing::debug!(method = %name, mode = %streaming_mode, "extracted rpc");

    MethodDefinition {
        request_type_short: naming::strip_request_suffix(&request_bare),
        response_type_short: naming::strip_reply_suffix(&response_bare),
        request_type_full,
        response_type_full,
        client_streaming: streaming_mode.is_client_streaming(),
        server_streaming: streaming_mode.is_server_streaming(),
        streaming_mode,
        name,
    }
}

fn strip_leading_dot(type_ref: &str) -> &str {
    type_ref.strip_prefix('.').unwrap_or(type_ref)
}

/// Keywords for `FieldDescriptorProto.Type` codes 1 through 18
pub(crate) const WIRE_TYPE_KEYWORDS: [&str; 18] = [
    "double", "float", "int64", "uint64", "int32", "fixed64", "fixed32", "bool", "string",
    "group", "message", "bytes", "uint32", "enum", "sfixed32", "sfixed64", "sint32", "sint64",
];

/// Normalized field type token: keywords as written, message and enum
/// references bare and Pascal-cased like their declarations, repeated
/// fields `[]`-prefixed
pub(crate) fn field_type(type_ref: &str, repeated: bool) -> String {
    let base = if WIRE_TYPE_KEYWORDS.contains(&type_ref) || type_ref == "unknown" {
        type_ref.to_string()
    } else {
        naming::to_upper_camel_case(&naming::clean_type_name(type_ref))
    };
    if repeated {
        format!("[]{}", base)
    } else {
        base
    }
}

/// Build a field from its declared parts
pub(crate) fn build_field(name: &str, type_ref: &str, number: u32, repeated: bool) -> FieldDefinition {
    FieldDefinition::new(name, field_type(type_ref, repeated), number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_unary_method() {
        let method = build_method(
            "CreateUser",
            "CreateUserRequest",
            "CreateUserReply",
            false,
            false,
        );
        assert_eq!(method.name, "CreateUser");
        assert_eq!(method.request_type_short, "CreateUser");
        assert_eq!(method.response_type_short, "CreateUser");
        assert_eq!(method.streaming_mode, StreamingMode::Unary);
        assert!(!method.client_streaming);
        assert!(!method.server_streaming);
    }

    #[test]
    fn test_build_method_qualified_types() {
        let method = build_method(
            "list_users",
            ".user.v1.ListUsersRequest",
            "user.v1.ListUsersReply",
            false,
            true,
        );
        assert_eq!(method.name, "ListUsers");
        assert_eq!(method.request_type_full, "user.v1.ListUsersRequest");
        assert_eq!(method.response_type_full, "user.v1.ListUsersReply");
        assert_eq!(method.request_type_short, "ListUsers");
        assert_eq!(method.response_type_short, "ListUsers");
        assert_eq!(method.streaming_mode, StreamingMode::ServerStreaming);
        assert!(method.server_streaming);
    }

    #[test]
    fn test_build_method_without_suffix_convention() {
        let method = build_method("Ping", "google.protobuf.Empty", "PingResponse", true, true);
        assert_eq!(method.request_type_short, "Empty");
        assert_eq!(method.response_type_short, "PingResponse");
        assert_eq!(method.streaming_mode, StreamingMode::Bidirectional);
    }

    #[test]
    fn test_field_type() {
        assert_eq!(field_type("string", true), "[]string");
        assert_eq!(field_type(".shop.v1.Address", false), "Address");
        assert_eq!(field_type("shop.Tag", true), "[]Tag");
        assert_eq!(field_type("double", false), "double");
        assert_eq!(field_type("sint64", true), "[]sint64");
    }

    #[test]
    fn test_field_type_matches_message_casing() {
        assert_eq!(field_type("geo_point", false), "GeoPoint");
        assert_eq!(field_type(".shop.v1.Order.line_item", true), "[]LineItem");
        assert_eq!(field_type("unknown", false), "unknown");
    }

    #[test]
    fn test_build_field_basic_flag() {
        assert!(build_field("tags", "string", 3, true).is_basic_type);
        assert!(!build_field("address", "Address", 4, false).is_basic_type);
    }

    #[test]
    fn test_into_services_requires_a_service() {
        let facts = FileFacts::default();
        match facts.into_services("only_messages.proto") {
            Err(GeneratorError::NoService(name)) => assert_eq!(name, "only_messages.proto"),
            other => panic!("expected NoService, got {other:?}"),
        }
    }

    #[test]
    fn test_into_services_shares_file_facts() {
        let facts = FileFacts {
            proto_package: "shop.v1".to_string(),
            go_package: "acme/api/shop/v1".to_string(),
            import_paths: vec!["common.proto".to_string()],
            messages: vec![MessageDefinition::new("Order")],
            services: vec![
                ("OrderService".to_string(), Vec::new()),
                ("CartService".to_string(), Vec::new()),
            ],
        };
        let services = facts.into_services("shop.proto").unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[1].name, "CartService");
        assert_eq!(services[1].proto_package, "shop.v1");
        assert_eq!(services[1].messages, services[0].messages);
    }
}
