//! Import insertion
//!
//! Ensures every required symbol is declared. A symbol counts as present
//! when its name occurs anywhere in the file; renamed imports are missed,
//! which only means an extra harmless check later.
//!
//! Missing symbols are added either into an existing single-line named
//! import from the same module, or as a new import line directly after the
//! anchor import. Without an anchor nothing new is inserted.

use super::Rewrite;
use crate::config::schema::RequiredImport;
use crate::error::{RouteCacheError, RouteCacheResult};
use regex::Regex;
use tracing::debug;

/// Named-import pattern for one module
#[derive(Debug, Clone)]
struct ModuleImport {
    module: String,
    named: Regex,
}

/// Adds required imports next to a known anchor import
#[derive(Debug, Clone)]
pub struct ImportRewriter {
    anchor: Regex,
    required: Vec<RequiredImport>,
    modules: Vec<ModuleImport>,
}

impl ImportRewriter {
    pub fn new(anchor_module: &str, required: Vec<RequiredImport>) -> RouteCacheResult<Self> {
        let anchor = Regex::new(&format!(
            r#"(?m)^[ \t]*import\s[^;]*?\bfrom\s*(['"]){}['"][ \t]*;?"#,
            regex::escape(anchor_module)
        ))
        .map_err(|e| RouteCacheError::Internal(format!("anchor pattern: {}", e)))?;

        let mut modules: Vec<ModuleImport> = Vec::new();
        for import in &required {
            if modules.iter().any(|m| m.module == import.module) {
                continue;
            }
            let named = Regex::new(&format!(
                r#"(?m)^[ \t]*import\s*\{{(?P<names>[^}}\n]*)\}}\s*from\s*['"]{}['"]"#,
                regex::escape(&import.module)
            ))
            .map_err(|e| RouteCacheError::Internal(format!("import pattern: {}", e)))?;
            modules.push(ModuleImport {
                module: import.module.clone(),
                named,
            });
        }

        Ok(Self {
            anchor,
            required,
            modules,
        })
    }

    /// Required imports whose symbol does not occur in `content`
    pub fn missing<'a>(&'a self, content: &str) -> Vec<&'a RequiredImport> {
        self.required
            .iter()
            .filter(|import| !content.contains(import.symbol.as_str()))
            .collect()
    }

    /// Whether the anchor import is present
    pub fn has_anchor(&self, content: &str) -> bool {
        self.anchor.is_match(content)
    }

    /// Ensure all required imports are declared
    pub fn ensure_imports(&self, content: &str) -> Rewrite {
        let missing = self.missing(content);
        if missing.is_empty() {
            return Rewrite::unchanged(content);
        }

        let mut text = content.to_string();
        let mut new_lines: Vec<(String, Vec<&str>)> = Vec::new();

        for module in &self.modules {
            let symbols: Vec<&str> = missing
                .iter()
                .filter(|import| import.module == module.module)
                .map(|import| import.symbol.as_str())
                .collect();
            if symbols.is_empty() {
                continue;
            }

            if let Some(extended) = extend_named_import(&text, &module.named, &symbols) {
                debug!("Extended import from {} with {:?}", module.module, symbols);
                text = extended;
            } else {
                new_lines.push((module.module.clone(), symbols));
            }
        }

        if !new_lines.is_empty() {
            match self.anchor.captures(&text) {
                Some(caps) => {
                    let quote = caps.get(1).map_or("'", |m| m.as_str());
                    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
                    let anchor = caps.get(0).map_or("", |m| m.as_str());
                    let terminator = if anchor.ends_with(';') { ";" } else { "" };
                    let insert_at = caps.get(0).map_or(0, |m| m.end());

                    let mut block = String::new();
                    for (module, symbols) in &new_lines {
                        block.push_str(newline);
                        block.push_str(&format!(
                            "import {{ {} }} from {}{}{}{}",
                            symbols.join(", "),
                            quote,
                            module,
                            quote,
                            terminator
                        ));
                    }
                    debug!("Inserting {} import line(s) after anchor", new_lines.len());
                    text.insert_str(insert_at, &block);
                }
                None => {
                    debug!("Anchor import not found; leaving imports unchanged");
                }
            }
        }

        let changed = text != content;
        Rewrite {
            content: text,
            changed,
        }
    }
}

/// Append symbols to `import { a } from 'module'` when it exists on one line
fn extend_named_import(content: &str, named: &Regex, symbols: &[&str]) -> Option<String> {
    let caps = named.captures(content)?;
    let names = caps.name("names")?;

    let mut list: Vec<&str> = names
        .as_str()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if list.is_empty() {
        return None;
    }
    list.extend(symbols.iter().copied());

    let mut result = String::with_capacity(content.len() + 32);
    result.push_str(&content[..names.start()]);
    result.push(' ');
    result.push_str(&list.join(", "));
    result.push(' ');
    result.push_str(&content[names.end()..]);
    Some(result)
}
