//! Folds walker callbacks into the intermediate model

use super::walker::{FieldDecl, RpcDecl, Visitor};
use crate::model::{self, FileFacts};
use protoscaffold_common::{naming, MessageDefinition, Result, ServiceDefinition};

/// Visitor that accumulates one schema unit's services and messages
#[derive(Debug, Default)]
pub struct ModelBuilder {
    facts: FileFacts,
    /// Indices into `facts.messages` of the messages currently open, innermost last
    open_messages: Vec<usize>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish the walk, failing if no service was declared
    pub fn finish(self, source_name: &str) -> Result<Vec<ServiceDefinition>> {
        self.facts.into_services(source_name)
    }
}

impl Visitor for ModelBuilder {
    fn visit_package(&mut self, name: &str) {
        tracing::debug!(package = %name, "extracted proto package");
        self.facts.proto_package = name.to_string();
    }

    fn visit_import(&mut self, path: &str) {
        self.facts.import_paths.push(path.to_string());
    }

    fn visit_option(&mut self, name: &str, value: &str) {
        if name == "go_package" {
            let path = naming::go_package_path(value);
            tracing::debug!(go_package = %path, "extracted go_package");
            self.facts.go_package = path;
        }
    }

    fn enter_message(&mut self, name: &str) {
        self.facts
            .messages
            .push(MessageDefinition::new(naming::to_upper_camel_case(name)));
        self.open_messages.push(self.facts.messages.len() - 1);
    }

    fn exit_message(&mut self) {
        self.open_messages.pop();
    }

    fn visit_field(&mut self, field: &FieldDecl) {
        let Some(&index) = self.open_messages.last() else {
            tracing::debug!(
                field = %field.name,
                location = %field.location,
                "field outside any message dropped"
            );
            return;
        };
        self.facts.messages[index].fields.push(model::build_field(
            &field.name,
            &field.type_name,
            field.number,
            field.repeated,
        ));
    }

    fn visit_service(&mut self, name: &str) {
        let name = naming::service_or_method_name(name);
        tracing::debug!(service = %name, "extracted service");
        self.facts.services.push((name, Vec::new()));
    }

    fn visit_rpc(&mut self, rpc: &RpcDecl) {
        let method = model::build_method(
            &rpc.name,
            &rpc.request_type,
            &rpc.response_type,
            rpc.request_streams,
            rpc.response_streams,
        );
        match self.facts.services.last_mut() {
            Some((_, methods)) => methods.push(method),
            None => tracing::debug!(
                rpc = %rpc.name,
                location = %rpc.location,
                "rpc outside any service dropped"
            ),
        }
    }
}
