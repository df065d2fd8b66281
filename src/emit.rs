//! Rendering of the loader header and source.
//!
//! Every function here is a pure function of the classified procedures, so
//! running the generator twice on the same registry gives identical files.

use std::borrow::Cow;
use std::io::{self, Write};
use std::rc::Rc;

use crate::classify::{classify, Category, ClassifiedProcedure, Level};
use crate::config::Config;
use crate::model::{Parameter, Procedure, Prototype, Version};

const INDENT: &str = "      ";

const GLOBAL_LOADER: &str = "get_globl_procs_vk";
const INSTANCE_LOADER: &str = "get_inst_procs_vk";
const DEVICE_LOADER: &str = "get_dev_procs_vk";
const CLEAR: &str = "clear_procs_vk";

/// Selects between the header (declarations) and source (definitions)
/// rendering of an item. Both render the same names in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Declaration,
    Definition,
}

/// Generated file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub header: String,
    pub source: String,
}

pub fn generate(procs: &[ClassifiedProcedure], version: &Version, config: &Config) -> io::Result<Output> {
    let mut header = Vec::new();
    write_header(procs, version, config, &mut header)?;
    let mut source = Vec::new();
    write_source(procs, version, config, &mut source)?;

    Ok(Output {
        header: into_string(header)?,
        source: into_string(source)?,
    })
}

fn into_string(buf: Vec<u8>) -> io::Result<String> {
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Writes `vk.h`.
pub fn write_header<W>(procs: &[ClassifiedProcedure], version: &Version, config: &Config, dest: &mut W) -> io::Result<()>
where
    W: io::Write,
{
    let procs = with_entry_points(procs, config);
    let procs = procs.as_ref();
    write_banner(version, dest)?;
    writeln!(
        dest,
        r#"
#ifndef GENVK_VK_H
#define GENVK_VK_H

#define VK_NO_PROTOTYPES
#if defined(__linux__)
# define VK_USE_PLATFORM_WAYLAND_KHR
# define VK_USE_PLATFORM_XCB_KHR
#elif defined(_WIN32)
# define VK_USE_PLATFORM_WIN32_KHR
#endif
#include <vulkan/vulkan.h>

#ifdef __cplusplus
extern "C" {{
#endif

/* Function pointers. */"#
    )?;
    gen_procs(procs, config, Mode::Declaration, dest)?;
    writeln!(
        dest,
        r#"
/* Functions that obtain the function pointers.
   The process of obtaining the procedures for use is as follows:
   1. Call {globl}, which fetches the {bootstrap} symbol;
   2. Create a valid VkInstance and call {inst};
   3. Create a valid VkDevice and call {dev};
   4. Call {clear} when done. */"#,
        globl = GLOBAL_LOADER,
        bootstrap = config.bootstrap_proc,
        inst = INSTANCE_LOADER,
        dev = DEVICE_LOADER,
        clear = CLEAR,
    )?;
    gen_getters(procs, config, Mode::Declaration, dest)?;
    writeln!(
        dest,
        r#"
#ifdef __cplusplus
}}
#endif

#endif /* GENVK_VK_H */"#
    )
}

/// Writes `vk.c`.
pub fn write_source<W>(procs: &[ClassifiedProcedure], version: &Version, config: &Config, dest: &mut W) -> io::Result<()>
where
    W: io::Write,
{
    let procs = with_entry_points(procs, config);
    let procs = procs.as_ref();
    write_banner(version, dest)?;
    writeln!(
        dest,
        r#"
#include <stddef.h>
#include "vk.h"

/* Defined by the bootstrap module. */
void *initVK(void);
void deinitVK(void);
"#
    )?;
    gen_procs(procs, config, Mode::Definition, dest)?;
    writeln!(dest)?;
    gen_getters(procs, config, Mode::Definition, dest)
}

/// `procs` preceded by the loader entry points it lacks. The loaders call
/// the bootstrap procedure and the device resolver whatever the registry
/// defines, so both always get a variable.
fn with_entry_points<'a>(procs: &'a [ClassifiedProcedure], config: &Config) -> Cow<'a, [ClassifiedProcedure]> {
    let entry_points = [
        (&config.bootstrap_proc, &config.instance_handles),
        (&config.device_resolver, &config.device_handles),
    ];
    let missing: Vec<ClassifiedProcedure> = entry_points
        .iter()
        .filter(|(name, _)| !procs.iter().any(|p| p.is_emitted(config) && p.name() == name.as_str()))
        .map(|(name, handles)| entry_point(name, handles.first(), config))
        .collect();

    if missing.is_empty() {
        Cow::Borrowed(procs)
    } else {
        Cow::Owned(missing.into_iter().chain(procs.iter().cloned()).collect())
    }
}

// PFN_vkVoidFunction name(<handle> handle, const char* pName)
fn entry_point(name: &str, handle: Option<&String>, config: &Config) -> ClassifiedProcedure {
    let mut params = Vec::new();
    if let Some(handle) = handle {
        params.push(Parameter {
            name: String::from("handle"),
            type_name: handle.clone(),
        });
    }
    params.push(Parameter {
        name: String::from("pName"),
        type_name: String::from("const char*"),
    });

    let procedure = Procedure {
        name: String::from(name),
        alias_of: None,
        prototype: Rc::new(Prototype {
            return_type: String::from("PFN_vkVoidFunction"),
            params,
        }),
    };
    let class = classify(&procedure, config);
    ClassifiedProcedure { procedure, class }
}

fn write_banner<W>(version: &Version, dest: &mut W) -> io::Result<()>
where
    W: io::Write,
{
    writeln!(dest, "/* Code generated by genvk.\n   [vk.xml {}] */", version)
}

/// Writes one function pointer variable per emitted procedure.
pub fn gen_procs<W>(procs: &[ClassifiedProcedure], config: &Config, mode: Mode, dest: &mut W) -> io::Result<()>
where
    W: io::Write,
{
    guarded(procs.iter(), config, dest, |p, dest| match mode {
        Mode::Declaration => writeln!(dest, "extern PFN_{name} {name};", name = p.name()),
        Mode::Definition => writeln!(dest, "PFN_{name} {name} = NULL;", name = p.name()),
    })
}

/// Writes the three loaders and the clear function.
pub fn gen_getters<W>(procs: &[ClassifiedProcedure], config: &Config, mode: Mode, dest: &mut W) -> io::Result<()>
where
    W: io::Write,
{
    if mode == Mode::Declaration {
        writeln!(dest, "int {}(void);", GLOBAL_LOADER)?;
        writeln!(dest, "void {}(VkInstance);", INSTANCE_LOADER)?;
        writeln!(dest, "void {}(VkDevice);", DEVICE_LOADER)?;
        return writeln!(dest, "void {}(void);", CLEAR);
    }

    write_loader(procs, config, Level::Global, dest)?;
    writeln!(dest)?;
    write_loader(procs, config, Level::Instance, dest)?;
    writeln!(dest)?;
    write_loader(procs, config, Level::Device, dest)?;
    writeln!(dest)?;
    write_clear(procs, config, dest)
}

fn write_loader<W>(procs: &[ClassifiedProcedure], config: &Config, level: Level, dest: &mut W) -> io::Result<()>
where
    W: io::Write,
{
    let bootstrap = config.bootstrap_proc.as_str();
    let (signature, resolver, handle) = match level {
        Level::Global => (format!("int\n{}(void)", GLOBAL_LOADER), bootstrap, "NULL"),
        Level::Instance => (format!("void\n{}(VkInstance h)", INSTANCE_LOADER), bootstrap, "h"),
        Level::Device => (
            format!("void\n{}(VkDevice h)", DEVICE_LOADER),
            config.device_resolver.as_str(),
            "h",
        ),
    };

    writeln!(dest, "{}\n{{", signature)?;
    writeln!(dest, "{}PFN_vkVoidFunction fp = NULL;", INDENT)?;
    if level == Level::Global {
        writeln!(dest, "{}{name} = (PFN_{name})initVK();", INDENT, name = bootstrap)?;
        writeln!(dest, "{}if ({} == NULL)", INDENT, bootstrap)?;
        writeln!(dest, "{}{}return -1;", INDENT, INDENT)?;
    }

    let members = procs
        .iter()
        .filter(|p| p.class.level == level && p.name() != bootstrap);
    guarded(members, config, dest, |p, dest| {
        writeln!(dest, "{}fp = {}({}, \"{}\");", INDENT, resolver, handle, p.name())?;
        writeln!(dest, "{}{name} = (PFN_{name})fp;", INDENT, name = p.name())
    })?;

    if level == Level::Global {
        writeln!(dest, "{}return 0;", INDENT)?;
    }
    writeln!(dest, "}}")
}

fn write_clear<W>(procs: &[ClassifiedProcedure], config: &Config, dest: &mut W) -> io::Result<()>
where
    W: io::Write,
{
    writeln!(dest, "void\n{}(void)\n{{", CLEAR)?;
    guarded(procs.iter(), config, dest, |p, dest| {
        writeln!(dest, "{}{} = NULL;", INDENT, p.name())
    })?;
    writeln!(dest, "{}deinitVK();", INDENT)?;
    writeln!(dest, "}}")
}

/// Renders every emitted procedure of `procs` with `render`.
///
/// Non-extension procedures come first, in order. Extension procedures follow,
/// partitioned by category in order of first appearance, and each non-empty
/// partition is wrapped in its category's guard.
fn guarded<'a, I, W, F>(procs: I, config: &Config, dest: &mut W, mut render: F) -> io::Result<()>
where
    I: Iterator<Item = &'a ClassifiedProcedure>,
    W: io::Write,
    F: FnMut(&ClassifiedProcedure, &mut Vec<u8>) -> io::Result<()>,
{
    let mut plain = Vec::new();
    let mut groups: Vec<(Category, Vec<u8>)> = Vec::new();

    for p in procs.filter(|p| p.is_emitted(config)) {
        if !p.class.is_extension {
            render(p, &mut plain)?;
            continue;
        }
        let category = p.class.category;
        let pos = match groups.iter().position(|(c, _)| *c == category) {
            Some(pos) => pos,
            None => {
                groups.push((category, Vec::new()));
                groups.len() - 1
            }
        };
        render(p, &mut groups[pos].1)?;
    }

    dest.write_all(&plain)?;
    for (category, text) in groups {
        if text.is_empty() {
            continue;
        }
        match config.extensions.guard_of(category) {
            Some(guard) => {
                writeln!(dest, "#ifdef {}", guard)?;
                dest.write_all(&text)?;
                writeln!(dest, "#endif")?;
            }
            None => dest.write_all(&text)?,
        }
    }

    Ok(())
}
