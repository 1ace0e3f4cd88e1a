//! HTML template system for page generation.
//!
//! Provides a lightweight template system using string interpolation rather than
//! heavy template engines like Tera or Handlebars:
//!
//! - `{{ name }}` / `{{ name? }}` - required / optional variable
//! - `{{ url("about.html") }}` - function call
//! - `{{ "Hello" | trans }}` - filter
//! - `{% include "_header.html" %}` - partial inclusion
//! - `{% trans %}Hello{% endtrans %}` - custom block
//!
//! Functions, filters and blocks are resolved by a [`TemplateExtension`].

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use glossa_core::CoreError;
use glossa_i18n::I18nError;
use thiserror::Error;
use walkdir::WalkDir;

/// Nested includes deeper than this are treated as recursive.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax in {template}: {message}")]
    InvalidSyntax { template: String, message: String },

    /// No extension provides the function.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// No extension provides the filter.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// No extension provides the block tag.
    #[error("unknown block tag: {0}")]
    UnknownBlock(String),

    /// Includes nested too deeply.
    #[error("include depth exceeded in {0}, is an include recursive?")]
    IncludeDepth(String),

    /// Language error raised by an extension.
    #[error(transparent)]
    Language(#[from] CoreError),

    /// Translation error raised by an extension.
    #[error(transparent)]
    I18n(#[from] I18nError),

    /// IO error while loading templates.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error while loading templates.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl TemplateError {
    fn syntax(template: &str, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            template: template.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Create context with initial variables.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Check if a variable exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }
}

/// Hooks for functions, filters and block tags used inside templates.
///
/// `template` is the name of the template being rendered, which differs from
/// the page name inside included partials.
pub trait TemplateExtension {
    /// Evaluate `name(arg)`.
    fn function(&mut self, _template: &str, name: &str, _arg: &str) -> Result<String> {
        Err(TemplateError::UnknownFunction(name.to_string()))
    }

    /// Evaluate `input | name`.
    fn filter(&mut self, _template: &str, name: &str, _input: &str) -> Result<String> {
        Err(TemplateError::UnknownFilter(name.to_string()))
    }

    /// Evaluate `{% name %}body{% endname %}` with the already rendered body.
    fn block(&mut self, _template: &str, name: &str, _body: &str) -> Result<String> {
        Err(TemplateError::UnknownBlock(name.to_string()))
    }
}

/// No functions, filters or blocks.
impl TemplateExtension for () {}

/// A template loaded from the templates directory or built in memory.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    /// Create a new template with the given name and content.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Get the template name (its path relative to the templates root).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a partial (`_`-prefixed file name), only usable via include.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.name
            .rsplit('/')
            .next()
            .is_some_and(|file| file.starts_with('_'))
    }

    /// Render the template with the given context, without includes or extensions.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut none = ();
        Renderer {
            registry: None,
            context,
            extension: &mut none,
        }
        .render(self, 0)
    }
}

/// Registry of templates, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Template>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.{extension}` file below `dir`. A missing directory yields
    /// an empty registry.
    pub fn load_dir(dir: &Path, extension: &str) -> Result<Self> {
        let mut registry = Self::new();
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "templates directory does not exist");
            return Ok(registry);
        }

        let extension = extension.trim_start_matches('.');
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().is_none_or(|ext| ext != extension)
            {
                continue;
            }

            let Ok(relative) = path.strip_prefix(dir) else {
                continue;
            };
            let name = relative.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(path)?;
            tracing::debug!(template = %name, "loaded template");
            registry.register(Template::new(name, content));
        }

        Ok(registry)
    }

    /// Register a template.
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Get a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// All templates, partials included, by name.
    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    /// Templates compiled into pages (everything except partials), by name.
    pub fn pages(&self) -> impl Iterator<Item = &Template> {
        self.templates.values().filter(|t| !t.is_partial())
    }

    /// Number of registered templates, partials included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no templates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        self.render_with(name, context, &mut ())
    }

    /// Render a named template, resolving functions, filters and blocks via `extension`.
    pub fn render_with(
        &self,
        name: &str,
        context: &TemplateContext,
        extension: &mut dyn TemplateExtension,
    ) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        Renderer {
            registry: Some(self),
            context,
            extension,
        }
        .render(template, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'t> {
    Text(&'t str),
    Expr(&'t str),
    Tag(&'t str),
}

fn tokenize<'t>(template: &str, content: &'t str) -> Result<Vec<Token<'t>>> {
    let mut tokens = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find('{') {
        let (close, is_expr) = match rest[start..].as_bytes().get(1).copied() {
            Some(b'{') => ("}}", true),
            Some(b'%') => ("%}", false),
            _ => {
                // Lone brace, keep scanning past it
                tokens.push(Token::Text(&rest[..=start]));
                rest = &rest[start + 1..];
                continue;
            }
        };

        if start > 0 {
            tokens.push(Token::Text(&rest[..start]));
        }
        let inner_start = start + 2;
        let end = rest[inner_start..].find(close).ok_or_else(|| {
            TemplateError::syntax(template, format!("unclosed {} delimiter", &rest[start..inner_start]))
        })?;
        let inner = rest[inner_start..inner_start + end].trim();
        tokens.push(if is_expr {
            Token::Expr(inner)
        } else {
            Token::Tag(inner)
        });
        rest = &rest[inner_start + end + 2..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest));
    }
    Ok(tokens)
}

struct Renderer<'r, 'e> {
    registry: Option<&'r TemplateRegistry>,
    context: &'r TemplateContext,
    extension: &'r mut (dyn TemplateExtension + 'e),
}

impl Renderer<'_, '_> {
    fn render(&mut self, template: &Template, depth: usize) -> Result<String> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(TemplateError::IncludeDepth(template.name.clone()));
        }

        let tokens = tokenize(&template.name, &template.content)?;
        let mut out = String::with_capacity(template.content.len());
        let mut pos = 0;
        self.render_tokens(&template.name, &tokens, &mut pos, depth, &mut out, None)?;
        Ok(out)
    }

    /// Render tokens from `pos` until `end_tag` (exclusive) or the end.
    fn render_tokens(
        &mut self,
        name: &str,
        tokens: &[Token<'_>],
        pos: &mut usize,
        depth: usize,
        out: &mut String,
        end_tag: Option<&str>,
    ) -> Result<()> {
        while let Some(token) = tokens.get(*pos) {
            *pos += 1;
            match *token {
                Token::Text(text) => out.push_str(text),
                Token::Expr(expr) => {
                    let value = self.eval(name, expr)?;
                    out.push_str(&value);
                }
                Token::Tag(tag) => {
                    let (head, arg) = tag.split_once(char::is_whitespace).unwrap_or((tag, ""));
                    if Some(head) == end_tag {
                        return Ok(());
                    }
                    if head == "include" {
                        let included = self.include(name, arg.trim(), depth)?;
                        out.push_str(&included);
                    } else if head.starts_with("end") {
                        return Err(TemplateError::syntax(name, format!("unexpected {{% {head} %}}")));
                    } else {
                        let close = format!("end{head}");
                        let mut body = String::new();
                        self.render_tokens(name, tokens, pos, depth, &mut body, Some(close.as_str()))?;
                        let value = self.extension.block(name, head, &body)?;
                        out.push_str(&value);
                    }
                }
            }
        }

        match end_tag {
            Some(tag) => Err(TemplateError::syntax(name, format!("missing {{% {tag} %}}"))),
            None => Ok(()),
        }
    }

    fn include(&mut self, name: &str, arg: &str, depth: usize) -> Result<String> {
        let target = string_literal(arg)
            .ok_or_else(|| TemplateError::syntax(name, "include expects a quoted template name"))?;
        let registry = self
            .registry
            .ok_or_else(|| TemplateError::NotFound(target.to_string()))?;
        let template = registry
            .get(target)
            .ok_or_else(|| TemplateError::NotFound(target.to_string()))?;
        self.render(template, depth + 1)
    }

    /// Evaluate `primary | filter | filter…`.
    fn eval(&mut self, name: &str, expr: &str) -> Result<String> {
        let mut segments = split_pipes(expr).into_iter();
        let primary = segments.next().unwrap_or_default();
        let mut value = self.eval_primary(name, primary)?;
        for filter in segments {
            value = self.extension.filter(name, filter, &value)?;
        }
        Ok(value)
    }

    fn eval_primary(&mut self, name: &str, expr: &str) -> Result<String> {
        if let Some(literal) = string_literal(expr) {
            return Ok(literal.to_string());
        }

        if let Some((function, rest)) = expr.split_once('(') {
            let arg = rest
                .strip_suffix(')')
                .ok_or_else(|| TemplateError::syntax(name, format!("unclosed call in `{expr}`")))?
                .trim();
            let arg = match string_literal(arg) {
                Some(literal) => literal.to_string(),
                None if arg.is_empty() => String::new(),
                None => self.variable(arg)?,
            };
            return self.extension.function(name, function.trim(), &arg);
        }

        self.variable(expr)
    }

    fn variable(&self, expr: &str) -> Result<String> {
        // Optional variable syntax: {{ variable? }}
        let (var_name, optional) = match expr.strip_suffix('?') {
            Some(stripped) => (stripped.trim(), true),
            None => (expr, false),
        };

        match self.context.get(var_name) {
            Some(v) => Ok(v.to_string()),
            None if optional => Ok(String::new()),
            None => Err(TemplateError::MissingVariable(var_name.to_string())),
        }
    }
}

/// Contents of a single- or double-quoted literal.
fn string_literal(s: &str) -> Option<&str> {
    let s = s.trim();
    ['"', '\''].into_iter().find_map(|quote| {
        s.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

/// Split on `|` outside of quotes, trimming each segment.
fn split_pipes(expr: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut quote = None;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            (None, '|') => {
                segments.push(expr[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(expr[start..].trim());
    segments
}
