/// Errors from which generation cannot recover. Nothing is written when one
/// of these is returned.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FatalError {
    #[error("bad xml file: 'registry' element not found")]
    MissingRegistryElement,

    #[error("bad xml file: unexpected root element '{0}'")]
    UnexpectedRoot(String),

    #[error("bad xml file: '{0}' element not found")]
    MissingElement(&'static str),

    #[error("bad xml file: alias chain through '{0}' never reaches a definition")]
    AliasCycle(String),

    #[error("bad xml file: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Errors from which parser can recover. The offending entry is dropped from
/// the resulting `Registry`, everything around it is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    MissingElement { xpath: String, name: String },
    MissingAttribute { xpath: String, name: String },
    Internal { desc: &'static str },
}

/// The subset of the Vulkan registry needed to generate the loader.
///
/// `commands` and `types` are `None` when the registry has no such container,
/// which is a structural error for the model but not for the parser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Registry {
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub commands: Option<Vec<Command>>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub types: Option<Vec<TypeDefine>>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub features: Vec<Feature>,
}

/// A command is just a Vulkan function.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum Command {
    /// `name` is another name for the function called `alias`.
    Alias {
        name: String,
        alias: String,
        api: Option<String>,
    },

    /// Defines a new Vulkan function.
    Definition(CommandDefinition),
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::Alias { name, .. } => name,
            Command::Definition(def) => &def.proto.name,
        }
    }

    pub fn api(&self) -> Option<&str> {
        match self {
            Command::Alias { api, .. } => api.as_deref(),
            Command::Definition(def) => def.api.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct CommandDefinition {
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Option<String>,

    /// Return type and name of the function.
    pub proto: NameWithType,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub params: Vec<CommandParam>,
}

/// Parameter for this Vulkan function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct CommandParam {
    /// Set when the parameter only exists in some API variants.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Option<String>,

    pub definition: NameWithType,
}

/// `type_name` holds the complete C type preceding the name, qualifiers and
/// pointer declarators included (e.g. `const VkAllocationCallbacks*`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct NameWithType {
    pub type_name: String,
    pub name: String,
}

/// A `<type category="define">` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct TypeDefine {
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub markup: Vec<DefineMarkup>,
}

impl TypeDefine {
    /// Name of the macro, from the `<name>` child.
    pub fn name(&self) -> Option<&str> {
        self.markup.iter().find_map(|m| match m {
            DefineMarkup::Name(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Text between the end of the first matching markup element and the next
    /// markup element.
    pub fn text_after<F>(&self, pred: F) -> Option<String>
    where
        F: Fn(&DefineMarkup) -> bool,
    {
        let pos = self.markup.iter().position(pred)?;
        let mut text = String::new();
        for m in &self.markup[pos + 1..] {
            match m {
                DefineMarkup::Text(t) => text.push_str(t),
                _ => break,
            }
        }
        Some(text)
    }
}

/// Text runs and markup children of a define, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum DefineMarkup {
    Text(String),
    Name(String),
    Type(String),
}

/// Feature level of the API, such as Vulkan 1.0 or 1.1
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Feature {
    pub name: String,

    /// Comma-separated list of API tags, e.g. `vulkan,vulkansc`.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Option<String>,

    /// Commands named by the `<require>` blocks.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub commands: Vec<String>,
}

/// Whether a comma-separated `api` attribute names `tag`. An absent attribute
/// applies to every API.
pub fn api_matches(api: Option<&str>, tag: &str) -> bool {
    match api {
        Some(list) => list.split(',').any(|t| t.trim() == tag),
        None => true,
    }
}

#[cfg(feature = "serialize")]
fn is_default<T: Default + Eq>(v: &T) -> bool {
    v.eq(&T::default())
}
