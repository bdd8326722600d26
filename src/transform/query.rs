//! Data-fetch wrapping
//!
//! Recognizes `const { data… } = await <client>.from(…)…` statements and
//! routes the awaited expression through the caching wrapper:
//!
//! ```text
//! const { data: users } = await unstable_cache(
//!   async () => await supabase.from('users').select('*').order('name'),
//!   ['users'],
//!   { revalidate: 300, tags: [CACHE_TAGS.users] }
//! )()
//! ```
//!
//! Only a small closed set of chain shapes is accepted. Zero or several
//! candidates leave the content untouched.

use super::eligibility::wrapper_call_regex;
use crate::config::schema::WrapConfig;
use crate::error::{RouteCacheError, RouteCacheResult};
use crate::policy::CachePolicy;
use crate::route::RoutePath;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static DATA_BINDING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bdata\b").unwrap());

/// Builder methods a cacheable read chain may use
const READ_METHODS: &[&str] = &[
    "from",
    "select",
    "eq",
    "neq",
    "gt",
    "gte",
    "lt",
    "lte",
    "like",
    "ilike",
    "is",
    "in",
    "contains",
    "containedBy",
    "overlaps",
    "match",
    "not",
    "or",
    "filter",
    "textSearch",
    "order",
    "range",
    "limit",
    "single",
    "maybeSingle",
];

/// Clients holding an already-built query; other clients must start at `.from(`
const PREBUILT_CLIENTS: &[&str] = &["query"];

/// Identifiers that are values, never request input
const LITERAL_IDENTS: &[&str] = &["true", "false", "null", "undefined"];

const ORDERING_METHODS: &[&str] = &["order", "range", "limit"];
const SINGLE_ROW_METHODS: &[&str] = &["single", "maybeSingle"];

/// Recognized data-fetch shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// Chain ends in `.single()` / `.maybeSingle()`
    SingleRow,
    /// Chain uses `.order()`, `.range()` or `.limit()`
    OrderedList,
    /// `from(…)` with select/filter calls only
    Select,
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SingleRow => "single-row",
            Self::OrderedList => "ordered-list",
            Self::Select => "select",
        };
        write!(f, "{}", name)
    }
}

/// Result of a wrap attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapOutcome {
    Wrapped { content: String, shape: QueryShape },
    /// Content unchanged; the reason says why no confident match exists
    NoMatch(String),
    AlreadyWrapped,
}

/// A recognized data-fetch statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch {
    /// Byte offset of `await`
    pub await_start: usize,
    /// Byte offset of the client identifier
    pub expr_start: usize,
    /// Byte offset just past the final `)`
    pub end: usize,
    pub client: String,
    pub shape: QueryShape,
}

/// Wraps a single recognized query in the caching wrapper
#[derive(Debug, Clone)]
pub struct QueryWrapper {
    wrapper: String,
    tag_registry: String,
    params_ident: String,
    head: Regex,
    wrapper_call: Regex,
}

impl QueryWrapper {
    pub fn new(config: &WrapConfig) -> RouteCacheResult<Self> {
        let clients = config
            .clients
            .iter()
            .map(|c| regex::escape(c))
            .collect::<Vec<_>>()
            .join("|");
        let head = Regex::new(&format!(
            r"\b(?:const|let)\s*\{{(?P<bindings>[^{{}}]*)\}}\s*=\s*(?P<await>await)\s+(?P<client>{})\b",
            clients
        ))
        .map_err(|e| RouteCacheError::Internal(format!("query pattern: {}", e)))?;

        Ok(Self {
            wrapper: config.wrapper.clone(),
            tag_registry: config.tag_registry.clone(),
            params_ident: config.params_ident.clone(),
            head,
            wrapper_call: wrapper_call_regex(&config.wrapper)?,
        })
    }

    /// All statements in `content` matching a known shape
    pub fn find_queries(&self, content: &str) -> Vec<QueryMatch> {
        let mut found = Vec::new();
        let inert = non_code_spans(content.as_bytes());

        for caps in self.head.captures_iter(content) {
            let (Some(head), Some(bindings), Some(await_kw), Some(client)) = (
                caps.get(0),
                caps.name("bindings"),
                caps.name("await"),
                caps.name("client"),
            ) else {
                continue;
            };
            if inert
                .iter()
                .any(|&(start, end)| start <= head.start() && head.start() < end)
            {
                debug!("Skipping match at byte {}: inside a comment or string", head.start());
                continue;
            }
            if !DATA_BINDING.is_match(bindings.as_str()) {
                continue;
            }

            let Some((methods, end)) = scan_chain(content, client.end()) else {
                debug!(
                    "Skipping {} chain at byte {}: not a plain call chain",
                    client.as_str(),
                    client.start()
                );
                continue;
            };
            let Some(shape) = classify_chain(client.as_str(), &methods) else {
                debug!("Skipping chain {:?}: unknown shape", methods);
                continue;
            };
            if !ends_statement(content, end) {
                debug!("Skipping chain {:?}: expression continues", methods);
                continue;
            }

            found.push(QueryMatch {
                await_start: await_kw.start(),
                expr_start: client.start(),
                end,
                client: client.as_str().to_string(),
                shape,
            });
        }

        found
    }

    /// Wrap the single recognized query, or abstain
    pub fn try_wrap(&self, content: &str, route: &RoutePath, policy: &CachePolicy) -> WrapOutcome {
        if self.wrapper_call.is_match(content) {
            return WrapOutcome::AlreadyWrapped;
        }

        let matches = self.find_queries(content);
        let query = match matches.as_slice() {
            [] => return WrapOutcome::NoMatch("no recognizable data-fetch query".to_string()),
            [only] => only,
            many => {
                return WrapOutcome::NoMatch(format!(
                    "{} candidate queries, cannot choose one",
                    many.len()
                ))
            }
        };

        let params = route.dynamic_segments();
        if let Some(missing) = params
            .iter()
            .find(|p| !content.contains(&format!("{}.{}", self.params_ident, p)))
        {
            return WrapOutcome::NoMatch(format!(
                "route parameter `{}` is not read as `{}.{}`",
                missing, self.params_ident, missing
            ));
        }

        let expr = &content[query.expr_start..query.end];
        let args = &expr[query.client.len()..];
        if let Some(input) = free_identifier(args, &self.params_ident, &params) {
            return WrapOutcome::NoMatch(format!(
                "query depends on request input `{}` not in the cache key",
                input
            ));
        }

        let indent = line_indent(content, query.await_start);
        let replacement = format!(
            "await {wrapper}(\n{indent}  async () => await {expr},\n{indent}  [{key}],\n{indent}  {{ revalidate: {secs}, tags: [{tag}] }}\n{indent})()",
            wrapper = self.wrapper,
            indent = indent,
            expr = expr,
            key = self.cache_key(&policy.cache_key_base, &params),
            secs = policy.revalidate_secs,
            tag = policy.tag.expression(&self.tag_registry),
        );

        let mut wrapped = String::with_capacity(content.len() + replacement.len());
        wrapped.push_str(&content[..query.await_start]);
        wrapped.push_str(&replacement);
        wrapped.push_str(&content[query.end..]);

        debug!(
            "Wrapped {} query on {} for {}",
            query.shape, query.client, route
        );
        WrapOutcome::Wrapped {
            content: wrapped,
            shape: query.shape,
        }
    }

    /// Key-parts element: `'base'`, or a template literal with route params
    fn cache_key(&self, base: &str, params: &[String]) -> String {
        if params.is_empty() {
            return format!("'{}'", base.replace('\\', "\\\\").replace('\'', "\\'"));
        }

        let mut key = String::from("`");
        key.push_str(
            &base
                .replace('\\', "\\\\")
                .replace('`', "\\`")
                .replace("${", "\\${"),
        );
        for param in params {
            key.push_str(&format!("-${{{}.{}}}", self.params_ident, param));
        }
        key.push('`');
        key
    }
}

fn classify_chain(client: &str, methods: &[String]) -> Option<QueryShape> {
    if !methods.iter().all(|m| READ_METHODS.contains(&m.as_str())) {
        return None;
    }

    let rooted = methods.first().is_some_and(|m| m == "from");
    if !rooted && !PREBUILT_CLIENTS.contains(&client) {
        return None;
    }
    if methods.iter().skip(1).any(|m| m == "from") {
        return None;
    }

    let single_at = methods
        .iter()
        .position(|m| SINGLE_ROW_METHODS.contains(&m.as_str()));
    if let Some(idx) = single_at {
        return (idx + 1 == methods.len()).then_some(QueryShape::SingleRow);
    }

    if methods
        .iter()
        .any(|m| ORDERING_METHODS.contains(&m.as_str()))
    {
        return Some(QueryShape::OrderedList);
    }

    rooted.then_some(QueryShape::Select)
}

/// Collect `.name(args)` calls starting at `pos`. Returns method names and
/// the offset just past the last call, or `None` on anything else.
fn scan_chain(src: &str, pos: usize) -> Option<(Vec<String>, usize)> {
    let bytes = src.as_bytes();
    let mut methods = Vec::new();
    let mut end = pos;

    loop {
        let dot = skip_trivia(bytes, end);
        if bytes.get(dot) != Some(&b'.') {
            break;
        }
        let name_start = skip_trivia(bytes, dot + 1);
        let name_end = identifier_end(bytes, name_start);
        if name_end == name_start {
            return None;
        }
        let open = skip_trivia(bytes, name_end);
        if bytes.get(open) != Some(&b'(') {
            return None;
        }
        let close = matching_paren(bytes, open)?;
        methods.push(src[name_start..name_end].to_string());
        end = close + 1;
    }

    if methods.is_empty() {
        None
    } else {
        Some((methods, end))
    }
}

fn skip_trivia(bytes: &[u8], mut i: usize) -> usize {
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) == Some(&b'/') && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if bytes.get(i) == Some(&b'/') && bytes.get(i + 1) == Some(&b'*') {
            i = block_comment_end(bytes, i).unwrap_or(bytes.len());
        } else {
            return i;
        }
    }
}

fn identifier_end(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
    {
        i += 1;
    }
    i
}

fn block_comment_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return Some(i + 2);
        }
        i += 1;
    }
    None
}

/// Offset of the `)` closing the `(` at `open`, skipping strings and comments
fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            quote @ (b'\'' | b'"' | b'`') => {
                i = string_end(bytes, i, quote)?;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = block_comment_end(bytes, i)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Offset just past the closing quote of the string starting at `start`
fn string_end(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' if quote != b'`' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Whether nothing but a terminator, comment or line end follows `end`
fn ends_statement(src: &str, end: usize) -> bool {
    let rest = src[end..].trim_start_matches([' ', '\t']);
    rest.is_empty()
        || rest.starts_with([';', '\n', '\r'])
        || rest.starts_with("//")
        || rest.starts_with("/*")
}

/// Byte ranges covered by comments and string literals
fn non_code_spans(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let end = match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => line_end(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                block_comment_end(bytes, i).unwrap_or(bytes.len())
            }
            quote @ (b'\'' | b'"' | b'`') => {
                string_end(bytes, i, quote).unwrap_or_else(|| line_end(bytes, i + 1))
            }
            _ => {
                i += 1;
                continue;
            }
        };
        spans.push((i, end));
        i = end;
    }

    spans
}

fn line_end(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

/// Offset of the `}` closing the `{` at `open`, skipping strings
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            quote @ (b'\'' | b'"' | b'`') => {
                i = string_end(bytes, i, quote)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// First identifier in `code` whose value can differ between requests.
///
/// Literals, member names, object keys and `params.<segment>` reads of the
/// route's own dynamic segments are fixed for a given cache key; anything
/// else (a search term, a user id, `${q}` inside a template) is not.
fn free_identifier(code: &str, params_ident: &str, segments: &[String]) -> Option<String> {
    let bytes = code.as_bytes();
    let mut prev: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        match b {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = line_end(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = block_comment_end(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'\'' | b'"' => {
                let end = string_end(bytes, i, b).unwrap_or(bytes.len());
                prev = Some(end - 1);
                i = end;
                continue;
            }
            b'`' => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] != b'`' {
                    if bytes[j] == b'\\' {
                        j += 2;
                    } else if bytes[j] == b'$' && bytes.get(j + 1) == Some(&b'{') {
                        let close = matching_brace(bytes, j + 1).unwrap_or(bytes.len());
                        let inner = &code[j + 2..close.max(j + 2)];
                        if let Some(found) = free_identifier(inner, params_ident, segments) {
                            return Some(found);
                        }
                        j = close + 1;
                    } else {
                        j += 1;
                    }
                }
                let end = (j + 1).min(bytes.len());
                prev = Some(end - 1);
                i = end;
                continue;
            }
            _ => {}
        }

        if b.is_ascii_digit() {
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.' || bytes[i] == b'_')
            {
                i += 1;
            }
            prev = Some(i - 1);
            continue;
        }

        let end = identifier_end(bytes, i);
        if end == i {
            prev = Some(i);
            i += 1;
            continue;
        }

        let ident = &code[i..end];
        let after = skip_trivia(bytes, end);
        let prev_byte = prev.map(|p| bytes[p]);
        let spread = prev.is_some_and(|p| p > 0 && bytes[p - 1] == b'.');
        let is_member = prev_byte == Some(b'.') && !spread;
        let is_key = matches!(prev_byte, Some(b'{') | Some(b','))
            && bytes.get(after) == Some(&b':');

        if is_member || is_key || LITERAL_IDENTS.contains(&ident) {
            prev = Some(end - 1);
            i = end;
            continue;
        }

        if ident == params_ident && bytes.get(after) == Some(&b'.') {
            let seg_start = skip_trivia(bytes, after + 1);
            let seg_end = identifier_end(bytes, seg_start);
            if segments.iter().any(|s| s == &code[seg_start..seg_end]) {
                prev = Some(seg_end.max(1) - 1);
                i = seg_end;
                continue;
            }
            return Some(code[i..seg_end].to_string());
        }

        return Some(ident.to_string());
    }

    None
}

/// Leading whitespace of the line containing `pos`
fn line_indent(src: &str, pos: usize) -> &str {
    let line_start = src[..pos].rfind('\n').map_or(0, |i| i + 1);
    let line = &src[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}
