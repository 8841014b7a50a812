//! Import table of one compilation unit

use std::collections::HashMap;

use crate::syntax::ImportDecl;

#[derive(Debug, Default, Clone)]
pub struct ImportTable {
    single: HashMap<String, String>,
    on_demand: Vec<String>,
    static_single: HashMap<String, String>,
    static_on_demand: Vec<String>,
}

impl ImportTable {
    pub fn from_imports(imports: &[ImportDecl]) -> Self {
        let mut table = Self::default();

        for import in imports {
            match (import.is_static, import.is_wildcard) {
                (false, false) => {
                    if let Some((_, simple)) = import.path.rsplit_once('.') {
                        table
                            .single
                            .entry(simple.to_string())
                            .or_insert_with(|| import.path.clone());
                    }
                }
                (false, true) => table.on_demand.push(import.path.clone()),
                (true, false) => {
                    if let Some((owner, member)) = import.path.rsplit_once('.') {
                        table
                            .static_single
                            .entry(member.to_string())
                            .or_insert_with(|| owner.to_string());
                    }
                }
                (true, true) => table.static_on_demand.push(import.path.clone()),
            }
        }

        table
    }

    /// Dotted path of the single-type import for `simple`.
    pub fn single(&self, simple: &str) -> Option<&str> {
        self.single.get(simple).map(String::as_str)
    }

    /// Non-static on-demand prefixes in declaration order.
    pub fn on_demand(&self) -> &[String] {
        &self.on_demand
    }

    /// Dotted owner path of the statically imported member `member`.
    pub fn static_member(&self, member: &str) -> Option<&str> {
        self.static_single.get(member).map(String::as_str)
    }

    pub fn static_on_demand(&self) -> &[String] {
        &self.static_on_demand
    }
}
