//! Integration test for the compiled descriptor parser

use prost::Message;
use prost_types::{
    field_descriptor_proto::{Label, Type},
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, FileOptions, MessageOptions, MethodDescriptorProto,
    OneofDescriptorProto, ServiceDescriptorProto,
};
use protoscaffold_common::{GeneratorError, StreamingMode};
use protoscaffold_parser::{DescriptorParser, ProtoParser, SchemaParser};
use std::io::Write;

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn reference(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, ty)
    }
}

fn repeated(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..field
    }
}

fn message(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field,
        ..Default::default()
    }
}

fn method(name: &str, input: &str, output: &str, client: bool, server: bool) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(format!(".shop.v1.{}", input)),
        output_type: Some(format!(".shop.v1.{}", output)),
        client_streaming: Some(client),
        server_streaming: Some(server),
        ..Default::default()
    }
}

/// Shop service with a nested message, a map, a oneof and a proto3 optional
fn create_shop_file() -> FileDescriptorProto {
    let labels_entry = DescriptorProto {
        name: Some("LabelsEntry".to_string()),
        field: vec![
            scalar("key", 1, Type::String),
            scalar("value", 2, Type::String),
        ],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut nickname = scalar("nickname", 8, Type::String);
    nickname.oneof_index = Some(1);
    nickname.proto3_optional = Some(true);

    let mut email = scalar("email", 6, Type::String);
    email.oneof_index = Some(0);
    let mut phone = scalar("phone", 7, Type::String);
    phone.oneof_index = Some(0);

    let order = DescriptorProto {
        name: Some("Order".to_string()),
        field: vec![
            scalar("id", 1, Type::Int64),
            repeated(scalar("tags", 3, Type::String)),
            reference("address", 4, Type::Message, ".shop.v1.Address"),
            repeated(reference("labels", 5, Type::Message, ".shop.v1.Order.LabelsEntry")),
            email,
            phone,
            nickname,
            reference("status", 9, Type::Enum, ".shop.v1.Status"),
            repeated(reference("items", 10, Type::Message, ".shop.v1.Order.LineItem")),
            scalar("total", 11, Type::Double),
        ],
        nested_type: vec![
            message("LineItem", vec![scalar("sku", 1, Type::String)]),
            labels_entry,
        ],
        oneof_decl: vec![
            OneofDescriptorProto {
                name: Some("contact".to_string()),
                ..Default::default()
            },
            OneofDescriptorProto {
                name: Some("_nickname".to_string()),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let status = EnumDescriptorProto {
        name: Some("Status".to_string()),
        value: vec![EnumValueDescriptorProto {
            name: Some("STATUS_UNSPECIFIED".to_string()),
            number: Some(0),
            ..Default::default()
        }],
        ..Default::default()
    };

    FileDescriptorProto {
        name: Some("shop/v1/shop.proto".to_string()),
        package: Some("shop.v1".to_string()),
        message_type: vec![
            order,
            message("Address", vec![scalar("city", 1, Type::String)]),
            message("CreateOrderRequest", vec![]),
            message("CreateOrderReply", vec![]),
            message("UploadRequest", vec![]),
            message("UploadReply", vec![]),
            message("WatchRequest", vec![]),
            message("WatchReply", vec![]),
            message("ChatRequest", vec![]),
            message("ChatReply", vec![]),
        ],
        enum_type: vec![status],
        service: vec![
            ServiceDescriptorProto {
                name: Some("OrderService".to_string()),
                method: vec![
                    method("CreateOrder", "CreateOrderRequest", "CreateOrderReply", false, false),
                    method("Upload", "UploadRequest", "UploadReply", true, false),
                    method("Watch", "WatchRequest", "WatchReply", false, true),
                    method("Chat", "ChatRequest", "ChatReply", true, true),
                ],
                ..Default::default()
            },
            ServiceDescriptorProto {
                name: Some("AdminService".to_string()),
                ..Default::default()
            },
        ],
        options: Some(FileOptions {
            go_package: Some("github.com/acme/shop/api/v1;shopv1".to_string()),
            ..Default::default()
        }),
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn parse_shop() -> Vec<protoscaffold_common::ServiceDefinition> {
    let set = FileDescriptorSet {
        file: vec![create_shop_file()],
    };
    let parser = DescriptorParser::from_file_descriptor_set(&set.encode_to_vec()).unwrap();
    parser.parse_all().unwrap()
}

#[test]
fn test_file_level_facts() {
    let services = parse_shop();
    assert_eq!(services.len(), 2);

    let service = &services[0];
    assert_eq!(service.name, "OrderService");
    assert_eq!(service.proto_package, "shop.v1");
    assert_eq!(service.go_package, "github.com/acme/shop/api/v1");
    assert_eq!(services[1].name, "AdminService");
    assert!(services[1].methods.is_empty());
    assert_eq!(services[1].messages, service.messages);
}

#[test]
fn test_methods_and_streaming_modes() {
    let service = parse_shop().remove(0);
    let modes: Vec<_> = service
        .methods
        .iter()
        .map(|m| (m.name.as_str(), m.streaming_mode))
        .collect();
    assert_eq!(
        modes,
        vec![
            ("CreateOrder", StreamingMode::Unary),
            ("Upload", StreamingMode::ClientStreaming),
            ("Watch", StreamingMode::ServerStreaming),
            ("Chat", StreamingMode::Bidirectional),
        ]
    );

    let create = &service.methods[0];
    assert_eq!(create.request_type_full, "shop.v1.CreateOrderRequest");
    assert_eq!(create.response_type_full, "shop.v1.CreateOrderReply");
    assert_eq!(create.request_type_short, "CreateOrder");
    assert_eq!(create.response_type_short, "CreateOrder");
}

#[test]
fn test_messages_skip_map_entries_and_keep_nesting_order() {
    let service = parse_shop().remove(0);
    let names: Vec<_> = service.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(&names[..3], &["Order", "LineItem", "Address"]);
    assert!(!names.contains(&"LabelsEntry"));
}

#[test]
fn test_field_types() {
    let service = parse_shop().remove(0);
    let order = &service.messages[0];
    let fields: Vec<_> = order
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.field_type.as_str(), f.number, f.is_basic_type))
        .collect();

    assert_eq!(
        fields,
        vec![
            ("id", "int64", 1, true),
            ("tags", "[]string", 3, true),
            ("address", "Address", 4, false),
            ("nickname", "string", 8, true),
            ("status", "Status", 9, false),
            ("items", "[]LineItem", 10, false),
            ("total", "double", 11, false),
        ]
    );
}

#[test]
fn test_from_file_and_single_file_proto() {
    let file = create_shop_file();

    let single = DescriptorParser::from_file_descriptor_proto(&file.encode_to_vec()).unwrap();
    assert_eq!(single.parse().unwrap().name, "OrderService");

    let set = FileDescriptorSet { file: vec![file] };
    let mut out = tempfile::Builder::new().suffix(".pb").tempfile().unwrap();
    out.write_all(&set.encode_to_vec()).unwrap();

    let parser = DescriptorParser::from_file(out.path()).unwrap();
    assert_eq!(parser.source_name(), out.path().display().to_string());
    assert_eq!(parser.parse().unwrap().methods.len(), 4);
}

#[test]
fn test_primary_file_is_last_in_set() {
    let common = FileDescriptorProto {
        name: Some("common.proto".to_string()),
        package: Some("common".to_string()),
        message_type: vec![message("Money", vec![scalar("units", 1, Type::Int64)])],
        ..Default::default()
    };
    let billing = FileDescriptorProto {
        name: Some("billing.proto".to_string()),
        package: Some("billing".to_string()),
        dependency: vec!["common.proto".to_string()],
        message_type: vec![
            message(
                "ChargeRequest",
                vec![reference("amount", 1, Type::Message, ".common.Money")],
            ),
            message("ChargeReply", vec![]),
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("Billing".to_string()),
            method: vec![MethodDescriptorProto {
                name: Some("Charge".to_string()),
                input_type: Some(".billing.ChargeRequest".to_string()),
                output_type: Some(".billing.ChargeReply".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };

    let set = FileDescriptorSet {
        file: vec![common, billing],
    };
    let service = DescriptorParser::from_file_descriptor_set(&set.encode_to_vec())
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(service.name, "Billing");
    assert_eq!(service.import_paths, vec!["common.proto".to_string()]);
    assert_eq!(service.messages.len(), 2);
    assert_eq!(service.messages[0].fields[0].field_type, "Money");
}

#[test]
fn test_messages_only_file_has_no_service() {
    let file = FileDescriptorProto {
        name: Some("types.proto".to_string()),
        message_type: vec![message("Only", vec![])],
        ..Default::default()
    };
    let parser = DescriptorParser::from_file_descriptor_proto(&file.encode_to_vec()).unwrap();
    assert!(matches!(parser.parse(), Err(GeneratorError::NoService(_))));
}

#[test]
fn test_missing_descriptor_file() {
    let result = DescriptorParser::from_file("/nonexistent/api.pb");
    assert!(matches!(result, Err(GeneratorError::Read { .. })));
}

#[test]
fn test_same_model_as_text_strategy() {
    let source = r#"
        syntax = "proto3";
        package billing;
        option go_package = "acme/billing;billing";

        service Billing {
            rpc Charge (ChargeRequest) returns (ChargeReply);
        }

        message ChargeRequest {
            int64 amount = 1;
            repeated string notes = 2;
        }
        message ChargeReply {}
    "#;
    let from_text = ProtoParser::from_source("billing.proto", source)
        .parse()
        .unwrap();

    let file = FileDescriptorProto {
        name: Some("billing.proto".to_string()),
        package: Some("billing".to_string()),
        message_type: vec![
            message(
                "ChargeRequest",
                vec![
                    scalar("amount", 1, Type::Int64),
                    repeated(scalar("notes", 2, Type::String)),
                ],
            ),
            message("ChargeReply", vec![]),
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("Billing".to_string()),
            method: vec![MethodDescriptorProto {
                name: Some("Charge".to_string()),
                input_type: Some(".billing.ChargeRequest".to_string()),
                output_type: Some(".billing.ChargeReply".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        options: Some(FileOptions {
            go_package: Some("acme/billing;billing".to_string()),
            ..Default::default()
        }),
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };
    let from_descriptor = DescriptorParser::from_file_descriptor_proto(&file.encode_to_vec())
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(from_text.messages, from_descriptor.messages);
    assert_eq!(from_text.go_package, from_descriptor.go_package);
    assert_eq!(from_text.methods[0].name, from_descriptor.methods[0].name);
    assert_eq!(
        from_text.methods[0].request_type_short,
        from_descriptor.methods[0].request_type_short
    );
}

#[test]
fn test_group_body_is_dropped_like_text_strategy() {
    let source = r#"
        syntax = "proto2";
        package search;

        service Searcher {
            rpc Find (FindRequest) returns (FindReply);
        }

        message FindRequest {
            required string query = 1;
            repeated group Result = 2 {
                required string url = 3;
            }
        }
        message FindReply {}
    "#;
    let from_text = ProtoParser::from_source("search.proto", source)
        .parse()
        .unwrap();

    let find_request = DescriptorProto {
        name: Some("FindRequest".to_string()),
        field: vec![
            FieldDescriptorProto {
                label: Some(Label::Required as i32),
                ..scalar("query", 1, Type::String)
            },
            repeated(reference("result", 2, Type::Group, ".search.FindRequest.Result")),
        ],
        nested_type: vec![message(
            "Result",
            vec![FieldDescriptorProto {
                label: Some(Label::Required as i32),
                ..scalar("url", 3, Type::String)
            }],
        )],
        ..Default::default()
    };
    let file = FileDescriptorProto {
        name: Some("search.proto".to_string()),
        package: Some("search".to_string()),
        message_type: vec![find_request, message("FindReply", vec![])],
        service: vec![ServiceDescriptorProto {
            name: Some("Searcher".to_string()),
            method: vec![MethodDescriptorProto {
                name: Some("Find".to_string()),
                input_type: Some(".search.FindRequest".to_string()),
                output_type: Some(".search.FindReply".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    };
    let from_descriptor = DescriptorParser::from_file_descriptor_proto(&file.encode_to_vec())
        .unwrap()
        .parse()
        .unwrap();

    let names: Vec<_> = from_descriptor.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["FindRequest", "FindReply"]);
    assert_eq!(from_text.messages, from_descriptor.messages);
}

#[test]
fn test_reference_casing_matches_text_strategy() {
    let source = r#"
        syntax = "proto3";
        package geo;
        service Locator { rpc Locate (LocateRequest) returns (LocateReply); }
        message LocateRequest { geo_point point = 1; }
        message LocateReply {}
        message geo_point { double lat = 1; }
    "#;
    let from_text = ProtoParser::from_source("geo.proto", source)
        .parse()
        .unwrap();

    let file = FileDescriptorProto {
        name: Some("geo.proto".to_string()),
        package: Some("geo".to_string()),
        message_type: vec![
            message(
                "LocateRequest",
                vec![reference("point", 1, Type::Message, ".geo.geo_point")],
            ),
            message("LocateReply", vec![]),
            message("geo_point", vec![scalar("lat", 1, Type::Double)]),
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("Locator".to_string()),
            method: vec![MethodDescriptorProto {
                name: Some("Locate".to_string()),
                input_type: Some(".geo.LocateRequest".to_string()),
                output_type: Some(".geo.LocateReply".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };
    let from_descriptor = DescriptorParser::from_file_descriptor_proto(&file.encode_to_vec())
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(from_descriptor.messages[0].fields[0].field_type, "GeoPoint");
    assert_eq!(from_descriptor.messages[2].name, "GeoPoint");
    assert_eq!(from_text.messages, from_descriptor.messages);
}
