use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::Config;
use crate::types::*;

/// A parameter of a procedure. Only its type matters to the generator: the
/// type of the first parameter decides the loading level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prototype {
    pub return_type: String,
    pub params: Vec<Parameter>,
}

/// A Vulkan procedure of the core API.
///
/// Aliases are procedures of their own that share the prototype of their
/// source and remember its name in `alias_of`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub name: String,
    pub alias_of: Option<String>,
    pub prototype: Rc<Prototype>,
}

impl Procedure {
    fn from_definition(def: &CommandDefinition, api: &str) -> Procedure {
        let params = def
            .params
            .iter()
            .filter(|p| api_matches(p.api.as_deref(), api))
            .map(|p| Parameter {
                name: p.definition.name.clone(),
                type_name: p.definition.type_name.clone(),
            })
            .collect();

        Procedure {
            name: def.proto.name.clone(),
            alias_of: None,
            prototype: Rc::new(Prototype {
                return_type: def.proto.type_name.clone(),
                params,
            }),
        }
    }

    /// New procedure called `name` with the same prototype as `self`.
    pub fn alias(&self, name: &str) -> Procedure {
        Procedure {
            name: String::from(name),
            alias_of: Some(self.name.clone()),
            prototype: Rc::clone(&self.prototype),
        }
    }

    /// Name of the procedure this one was declared from; its own name unless
    /// it is an alias.
    pub fn source_name(&self) -> &str {
        self.alias_of.as_deref().unwrap_or(&self.name)
    }

    pub fn params(&self) -> &[Parameter] {
        &self.prototype.params
    }
}

/// Header version, for informational purposes only. Fields are left empty
/// when the registry lacks the version markers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Version {
    pub major: String,
    pub minor: String,
    pub patch: String,
}

impl Version {
    pub fn from_defines(defines: &[TypeDefine], api: &str) -> Version {
        let mut version = Version::default();

        for define in defines.iter().filter(|d| api_matches(d.api.as_deref(), api)) {
            match define.name() {
                // #define VK_HEADER_VERSION 280
                Some("VK_HEADER_VERSION") => {
                    if let Some(text) = define.text_after(|m| matches!(m, DefineMarkup::Name(_))) {
                        version.patch = text.trim().to_owned();
                    }
                }
                // #define VK_HEADER_VERSION_COMPLETE VK_MAKE_API_VERSION(0, 1, 3, VK_HEADER_VERSION)
                Some("VK_HEADER_VERSION_COMPLETE") => {
                    if let Some(text) = define.text_after(|m| matches!(m, DefineMarkup::Type(_))) {
                        let fields: Vec<&str> = text.split(',').collect();
                        let n = fields.len();
                        if n >= 3 {
                            version.minor = fields[n - 2].trim().to_owned();
                            version.major = fields[n - 3]
                                .trim_matches(|c: char| c.is_whitespace() || c == '(')
                                .to_owned();
                        }
                    }
                }
                _ => {}
            }
        }

        version
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Every core procedure of a registry, in declaration order, with alias
/// procedures right after their source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub procedures: Vec<Procedure>,
    pub version: Version,
}

impl Model {
    pub fn from_registry(registry: &Registry, config: &Config) -> Result<Model, FatalError> {
        let commands = registry
            .commands
            .as_ref()
            .ok_or(FatalError::MissingElement("commands"))?;
        let defines = registry
            .types
            .as_ref()
            .ok_or(FatalError::MissingElement("types"))?;

        let api = config.api.as_str();
        let excluded = excluded_commands(&registry.features, api);
        let aliases = collect_aliases(commands, api)?;

        let mut defined = HashSet::new();
        let mut kept = Vec::new();
        for command in commands.iter().filter(|c| api_matches(c.api(), api)) {
            let def = match command {
                Command::Definition(def) => def,
                _ => continue,
            };
            if !defined.insert(def.proto.name.as_str()) {
                warn!("duplicate definition of {}, keeping the first", def.proto.name);
                continue;
            }
            if excluded.contains(def.proto.name.as_str()) {
                debug!("{} belongs to another API, skipped", def.proto.name);
                continue;
            }
            kept.push(Procedure::from_definition(def, api));
        }

        let mut procedures = Vec::with_capacity(kept.len());
        let mut synthesized = HashSet::new();
        for procedure in kept {
            let names = aliases.get(procedure.name.as_str()).cloned().unwrap_or_default();
            let source = procedure.clone();
            procedures.push(procedure);
            for name in names {
                if excluded.contains(name) || defined.contains(name) || !synthesized.insert(name) {
                    continue;
                }
                procedures.push(source.alias(name));
            }
        }

        Ok(Model {
            procedures,
            version: Version::from_defines(defines, api),
        })
    }
}

/// Commands required by features that do not target the core API.
fn excluded_commands<'a>(features: &'a [Feature], api: &str) -> HashSet<&'a str> {
    features
        .iter()
        .filter(|f| !api_matches(f.api.as_deref(), api))
        .flat_map(|f| f.commands.iter().map(String::as_str))
        .collect()
}

/// Maps each source procedure to the names declared as its aliases, in
/// declaration order. Aliases of aliases are attached to the final source.
fn collect_aliases<'a>(
    commands: &'a [Command],
    api: &str,
) -> Result<HashMap<&'a str, Vec<&'a str>>, FatalError> {
    let entries: Vec<(&str, &str)> = commands
        .iter()
        .filter(|c| api_matches(c.api(), api))
        .filter_map(|c| match c {
            Command::Alias { name, alias, .. } => Some((name.as_str(), alias.as_str())),
            _ => None,
        })
        .collect();
    let targets: HashMap<&str, &str> = entries.iter().cloned().collect();

    let mut aliases: HashMap<&str, Vec<&str>> = HashMap::new();
    for &(name, alias) in &entries {
        let mut source = alias;
        let mut steps = 0;
        while let Some(&next) = targets.get(source) {
            steps += 1;
            if steps > targets.len() {
                return Err(FatalError::AliasCycle(String::from(name)));
            }
            source = next;
        }
        aliases.entry(source).or_default().push(name);
    }

    Ok(aliases)
}
