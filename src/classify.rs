use crate::config::Config;
use crate::model::{Parameter, Procedure};

/// Scope at which the address of a procedure is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Level {
    /// Resolved without any handle.
    Global,
    /// Resolved through `vkGetInstanceProcAddr` with a `VkInstance`.
    Instance,
    /// Resolved through `vkGetDeviceProcAddr` with a `VkDevice`.
    Device,
}

/// Platform or vendor surface an extension procedure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Category {
    /// Not an extension, or an extension nothing consumes.
    None,
    Common,
    Wayland,
    Win32,
    Xcb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Classification {
    /// The name ends with a vendor tag.
    pub is_extension: bool,
    pub level: Level,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedProcedure {
    pub procedure: Procedure,
    pub class: Classification,
}

impl ClassifiedProcedure {
    pub fn name(&self) -> &str {
        &self.procedure.name
    }

    /// Whether generated code mentions this procedure at all. Extensions that
    /// no lookup list claims are left out.
    pub fn is_emitted(&self, config: &Config) -> bool {
        self.name().starts_with(config.name_prefix.as_str())
            && (!self.class.is_extension || self.class.category != Category::None)
    }
}

/// Classifies `procedure` by the name and prototype of its source, so aliases
/// always share the classification of the procedure they were declared from.
pub fn classify(procedure: &Procedure, config: &Config) -> Classification {
    let name = procedure.source_name();
    let is_extension = name.chars().last().map_or(false, char::is_uppercase);
    let category = if is_extension {
        config.extensions.category_of(name)
    } else {
        Category::None
    };

    Classification {
        is_extension,
        level: level_of(name, procedure.params(), config),
        category,
    }
}

pub fn classify_all(procedures: Vec<Procedure>, config: &Config) -> Vec<ClassifiedProcedure> {
    procedures
        .into_iter()
        .map(|procedure| {
            let class = classify(&procedure, config);
            ClassifiedProcedure { procedure, class }
        })
        .collect()
}

fn level_of(name: &str, params: &[Parameter], config: &Config) -> Level {
    let first = match params.first() {
        Some(p) => p.type_name.as_str(),
        None => return Level::Global,
    };

    if config.instance_handles.iter().any(|h| h == first) {
        Level::Instance
    } else if config.device_handles.iter().any(|h| h == first) {
        // vkGetDeviceProcAddr is obtained from vkGetInstanceProcAddr using a
        // valid VkInstance handle.
        if name == config.device_resolver {
            Level::Instance
        } else {
            Level::Device
        }
    } else {
        Level::Global
    }
}
