use std::collections::HashMap;

/// Maps project names to the name they should be published under.
#[derive(Clone, Debug, Default)]
pub struct ProjectNameAliaser {
    aliases: HashMap<String, String>,
}

impl ProjectNameAliaser {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        ProjectNameAliaser { aliases }
    }

    /// The alias of `name`, or `name` itself when it has none.
    pub fn apply(&self, name: String) -> String {
        match self.aliases.get(&name) {
            Some(alias) => alias.clone(),
            None => name,
        }
    }
}
