// This module holds the in-memory model of the declarative operation spec and its loader.
// Each YAML entry names an operation and carries a C-like argument list such as
// "(Tensor x, IntArray axis={}, bool keepdim=false)". The argument list is split at top-level
// commas (braces, brackets and quotes are respected), each parameter is classified into an
// OperandKind from a closed set, and tensor-kind parameters become inputs while everything
// else becomes an attribute with an optional default literal. A second YAML document, the
// allow-list, marks which entries take part in generation. Declarations are read before their
// argument lists are parsed so that the allow-list can be applied first: only allow-listed
// entries have to use the closed type set. Entry order is preserved across files exactly as
// given, since generated declaration order follows it.

//! Operation spec model and YAML loading.

use std::fmt;
use std::fs;
use std::path::Path;

use hashbrown::HashSet;
use serde::Deserialize;

use crate::error::{GenError, GenResult};

/// Suffix marking an operation that mutates and returns its receiver.
pub const INPLACE_MARKER: char = '_';

/// Closed set of operand kinds an operation parameter can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    Tensor,
    TensorRef,
    OptionalTensor,
    TensorList,
    Scalar,
    IntArray,
    DataType,
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl OperandKind {
    /// Parse a spec type tag such as `Tensor[]` or `int64_t`.
    pub fn parse(tag: &str) -> Option<Self> {
        let kind = match tag {
            "Tensor" => OperandKind::Tensor,
            "Tensor&" => OperandKind::TensorRef,
            "Tensor?" => OperandKind::OptionalTensor,
            "Tensor[]" => OperandKind::TensorList,
            "Scalar" => OperandKind::Scalar,
            "IntArray" => OperandKind::IntArray,
            "DataType" => OperandKind::DataType,
            "bool" => OperandKind::Bool,
            "int" | "int32_t" => OperandKind::Int32,
            "int64_t" | "int64" => OperandKind::Int64,
            "float" => OperandKind::Float32,
            "double" => OperandKind::Float64,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether parameters of this kind are operation inputs rather than attributes.
    pub fn is_tensor(self) -> bool {
        matches!(
            self,
            OperandKind::Tensor
                | OperandKind::TensorRef
                | OperandKind::OptionalTensor
                | OperandKind::TensorList
        )
    }

    /// Rust parameter type used in every generated signature.
    pub fn rust_type(self) -> &'static str {
        match self {
            OperandKind::Tensor => "&Tensor",
            OperandKind::TensorRef => "&mut Tensor",
            OperandKind::OptionalTensor => "Option<&Tensor>",
            OperandKind::TensorList => "&[Tensor]",
            OperandKind::Scalar => "Scalar",
            OperandKind::IntArray => "&IntArray",
            OperandKind::DataType => "DataType",
            OperandKind::Bool => "bool",
            OperandKind::Int32 => "i32",
            OperandKind::Int64 => "i64",
            OperandKind::Float32 => "f32",
            OperandKind::Float64 => "f64",
        }
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            OperandKind::Tensor => "Tensor",
            OperandKind::TensorRef => "Tensor&",
            OperandKind::OptionalTensor => "Tensor?",
            OperandKind::TensorList => "Tensor[]",
            OperandKind::Scalar => "Scalar",
            OperandKind::IntArray => "IntArray",
            OperandKind::DataType => "DataType",
            OperandKind::Bool => "bool",
            OperandKind::Int32 => "int",
            OperandKind::Int64 => "int64_t",
            OperandKind::Float32 => "float",
            OperandKind::Float64 => "double",
        };
        f.write_str(tag)
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedParam {
    pub kind: OperandKind,
    pub name: String,
    /// Default literal, kept verbatim. Only attributes carry one.
    pub default: Option<String>,
}

impl TypedParam {
    pub fn new(kind: OperandKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Copy of this parameter without its default literal.
    pub fn without_default(&self) -> Self {
        Self {
            kind: self.kind,
            name: self.name.clone(),
            default: None,
        }
    }
}

/// One declared operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEntry {
    pub name: String,
    pub inputs: Vec<TypedParam>,
    pub attrs: Vec<TypedParam>,
    pub is_eligible: bool,
}

impl SpecEntry {
    pub fn new(name: impl Into<String>, inputs: Vec<TypedParam>, attrs: Vec<TypedParam>) -> Self {
        Self {
            name: name.into(),
            inputs,
            attrs,
            is_eligible: false,
        }
    }

    /// Build an entry from a spec argument list such as `(Tensor x, Scalar y = 1.0)`.
    pub fn from_args(name: &str, args: &str) -> GenResult<Self> {
        if !is_identifier(name) {
            return Err(GenError::MalformedArgs {
                op: name.to_string(),
                reason: "operation name is not an identifier".to_string(),
            });
        }
        let (inputs, attrs) = parse_args(name, args)?;
        Ok(Self::new(name, inputs, attrs))
    }

    pub fn eligible(mut self) -> Self {
        self.is_eligible = true;
        self
    }

    pub fn is_inplace(&self) -> bool {
        self.name.ends_with(INPLACE_MARKER)
    }
}

/// Split an argument list into tensor inputs and attributes.
///
/// Inputs must precede attributes, and inputs never carry defaults.
pub fn parse_args(op: &str, args: &str) -> GenResult<(Vec<TypedParam>, Vec<TypedParam>)> {
    let malformed = |reason: String| GenError::MalformedArgs {
        op: op.to_string(),
        reason,
    };

    let trimmed = args.trim();
    let body = trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| malformed(format!("expected a parenthesized list, found `{trimmed}`")))?;

    let mut inputs = Vec::new();
    let mut attrs: Vec<TypedParam> = Vec::new();

    for raw in split_top_level(body) {
        let raw = raw.trim();
        if raw.is_empty() {
            if body.trim().is_empty() {
                continue;
            }
            return Err(malformed("empty parameter".to_string()));
        }

        let (decl, default) = match find_top_level(raw, '=') {
            Some(pos) => (raw[..pos].trim(), Some(raw[pos + 1..].trim().to_string())),
            None => (raw, None),
        };
        let (ty, name) = decl
            .rsplit_once(char::is_whitespace)
            .map(|(ty, name)| (ty.trim(), name.trim()))
            .ok_or_else(|| malformed(format!("parameter `{raw}` has no name")))?;
        if !is_identifier(name) {
            return Err(malformed(format!("`{name}` is not a valid parameter name")));
        }
        if inputs.iter().chain(attrs.iter()).any(|p: &TypedParam| p.name == name) {
            return Err(malformed(format!("parameter `{name}` is declared twice")));
        }
        let kind = OperandKind::parse(ty).ok_or_else(|| GenError::UnknownType {
            op: op.to_string(),
            ty: ty.to_string(),
        })?;

        let mut param = TypedParam::new(kind, name);
        if kind.is_tensor() {
            if !attrs.is_empty() {
                return Err(malformed(format!(
                    "tensor `{name}` follows attribute `{}`",
                    attrs[attrs.len() - 1].name
                )));
            }
            if default.is_some() {
                return Err(malformed(format!("tensor `{name}` cannot have a default")));
            }
            inputs.push(param);
        } else {
            if let Some(literal) = default {
                if literal.is_empty() {
                    return Err(malformed(format!("attribute `{name}` has an empty default")));
                }
                param = param.with_default(literal);
            }
            attrs.push(param);
        }
    }

    Ok((inputs, attrs))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split at commas that are not nested in brackets, braces, parens or quotes.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut scanner = Nesting::default();
    for (pos, ch) in text.char_indices() {
        if ch == ',' && scanner.at_top() {
            parts.push(&text[start..pos]);
            start = pos + 1;
        } else {
            scanner.step(ch);
        }
    }
    parts.push(&text[start..]);
    parts
}

fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut scanner = Nesting::default();
    for (pos, ch) in text.char_indices() {
        if ch == needle && scanner.at_top() {
            return Some(pos);
        }
        scanner.step(ch);
    }
    None
}

#[derive(Default)]
struct Nesting {
    depth: usize,
    quote: Option<char>,
}

impl Nesting {
    fn at_top(&self) -> bool {
        self.depth == 0 && self.quote.is_none()
    }

    fn step(&mut self, ch: char) {
        match (self.quote, ch) {
            (Some(q), c) if c == q => self.quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => self.quote = Some(ch),
            (None, '(' | '[' | '{' | '<') => self.depth += 1,
            (None, ')' | ']' | '}' | '>') => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
    }
}

/// One operation as written in a spec file, before its argument list is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeclaredOp {
    #[serde(rename = "op")]
    pub name: String,
    pub args: String,
}

impl DeclaredOp {
    pub fn parse(&self) -> GenResult<SpecEntry> {
        SpecEntry::from_args(&self.name, &self.args)
    }
}

/// Read the operations of one YAML document without parsing their argument lists.
/// `origin` names the source in errors.
pub fn parse_declarations(yaml: &str, origin: &Path) -> GenResult<Vec<DeclaredOp>> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let declared: Option<Vec<DeclaredOp>> =
        serde_yaml::from_str(yaml).map_err(|source| GenError::Yaml {
            path: origin.to_path_buf(),
            source,
        })?;
    Ok(declared.unwrap_or_default())
}

/// Parse one YAML operation document, every argument list included.
pub fn parse_entries(yaml: &str, origin: &Path) -> GenResult<Vec<SpecEntry>> {
    parse_declarations(yaml, origin)?
        .iter()
        .map(DeclaredOp::parse)
        .collect()
}

/// Read every operation file in order and concatenate their declarations.
pub fn load_declarations<P: AsRef<Path>>(paths: &[P]) -> GenResult<Vec<DeclaredOp>> {
    let mut declared = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
        let loaded = parse_declarations(&text, path)?;
        log::debug!("loaded {} operations from {}", loaded.len(), path.display());
        declared.extend(loaded);
    }
    Ok(declared)
}

/// Load every operation file in order and parse all of their entries.
pub fn load_entries<P: AsRef<Path>>(paths: &[P]) -> GenResult<Vec<SpecEntry>> {
    load_declarations(paths)?
        .iter()
        .map(DeclaredOp::parse)
        .collect()
}

/// Names of the operations attached to the tensor type.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    names: Vec<String>,
    lookup: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = AllowList::default();
        for name in names {
            let name = name.into();
            if list.lookup.insert(name.clone()) {
                list.names.push(name);
            }
        }
        list
    }

    pub fn parse(yaml: &str, origin: &Path) -> GenResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(AllowList::default());
        }
        let names: Option<Vec<String>> =
            serde_yaml::from_str(yaml).map_err(|source| GenError::Yaml {
                path: origin.to_path_buf(),
                source,
            })?;
        Ok(AllowList::new(names.unwrap_or_default()))
    }

    pub fn load(path: &Path) -> GenResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
        Self::parse(&text, path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Set `is_eligible` on every entry and warn about names matching nothing.
    pub fn apply(&self, entries: &mut [SpecEntry]) {
        for entry in entries.iter_mut() {
            entry.is_eligible = self.contains(&entry.name);
        }
        self.warn_undeclared(entries.iter().map(|entry| entry.name.as_str()));
    }

    /// Parse the declarations into entries with eligibility set.
    ///
    /// Allow-listed declarations must parse. The others only need to parse to
    /// be kept; one that does not is dropped with a debug log, since it never
    /// takes part in generation.
    pub fn select(&self, declared: &[DeclaredOp]) -> GenResult<Vec<SpecEntry>> {
        let mut entries = Vec::with_capacity(declared.len());
        for op in declared {
            if self.contains(&op.name) {
                entries.push(op.parse()?.eligible());
                continue;
            }
            match op.parse() {
                Ok(entry) => entries.push(entry),
                Err(e) => log::debug!("dropping `{}`: not allow-listed and {e}", op.name),
            }
        }
        self.warn_undeclared(declared.iter().map(|op| op.name.as_str()));
        Ok(entries)
    }

    fn warn_undeclared<'a>(&self, declared: impl Iterator<Item = &'a str>) {
        let declared: HashSet<&str> = declared.collect();
        for name in &self.names {
            if !declared.contains(name.as_str()) {
                log::warn!("allow-listed operation `{name}` is not declared in any spec file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inputs_and_attributes() {
        let entry = SpecEntry::from_args(
            "sum",
            "(Tensor x, IntArray axis={}, DataType dtype=DataType::UNDEFINED, bool keepdim=false)",
        )
        .unwrap();

        assert_eq!(entry.inputs, vec![TypedParam::new(OperandKind::Tensor, "x")]);
        assert_eq!(entry.attrs.len(), 3);
        assert_eq!(entry.attrs[0].kind, OperandKind::IntArray);
        assert_eq!(entry.attrs[0].default.as_deref(), Some("{}"));
        assert_eq!(entry.attrs[1].default.as_deref(), Some("DataType::UNDEFINED"));
        assert_eq!(entry.attrs[2].name, "keepdim");
        assert!(!entry.is_inplace());
    }

    #[test]
    fn keeps_commas_inside_defaults() {
        let (_, attrs) = parse_args("reshape", "(Tensor x, IntArray shape={1, -1}, float eps = 1e-5)").unwrap();
        assert_eq!(attrs[0].default.as_deref(), Some("{1, -1}"));
        assert_eq!(attrs[1].kind, OperandKind::Float32);
        assert_eq!(attrs[1].default.as_deref(), Some("1e-5"));
    }

    #[test]
    fn classifies_tensor_kinds() {
        let (inputs, attrs) = parse_args("mix", "(Tensor x, Tensor? mask, Tensor[] rest, Tensor& out)").unwrap();
        let kinds: Vec<_> = inputs.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperandKind::Tensor,
                OperandKind::OptionalTensor,
                OperandKind::TensorList,
                OperandKind::TensorRef
            ]
        );
        assert!(attrs.is_empty());
    }

    #[test]
    fn inplace_follows_name_marker() {
        let entry = SpecEntry::from_args("relu_", "(Tensor x)").unwrap();
        assert!(entry.is_inplace());
    }

    #[test]
    fn rejects_unknown_type() {
        let err = parse_args("bad", "(Tensor x, Matrix m)").unwrap_err();
        assert!(matches!(err, GenError::UnknownType { ref ty, .. } if ty == "Matrix"));
    }

    #[test]
    fn rejects_tensor_after_attribute() {
        let err = parse_args("bad", "(Tensor x, bool flag, Tensor y)").unwrap_err();
        assert!(matches!(err, GenError::MalformedArgs { .. }));
    }

    #[test]
    fn rejects_missing_parens_and_names() {
        assert!(parse_args("bad", "Tensor x").is_err());
        assert!(parse_args("bad", "(Tensor)").is_err());
        assert!(parse_args("bad", "(Tensor x, )").is_err());
        assert!(parse_args("bad", "(Tensor x, bool x)").is_err());
        assert!(SpecEntry::from_args("not-an-op", "(Tensor x)").is_err());
    }

    #[test]
    fn empty_argument_list_has_no_inputs() {
        let (inputs, attrs) = parse_args("nothing", "()").unwrap();
        assert!(inputs.is_empty());
        assert!(attrs.is_empty());
    }

    #[test]
    fn loads_yaml_and_ignores_extra_keys() {
        let yaml = r#"
- op : add
  args : (Tensor x, Tensor y)
  output : Tensor(out)
  infer_meta :
    func : ElementwiseInferMeta
- op : exp
  args : (Tensor x)
"#;
        let entries = parse_entries(yaml, Path::new("ops.yaml")).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["add", "exp"]);
        assert!(entries.iter().all(|e| !e.is_eligible));
    }

    #[test]
    fn empty_document_has_no_entries() {
        assert!(parse_entries("", Path::new("empty.yaml")).unwrap().is_empty());
    }

    #[test]
    fn allow_list_marks_entries() {
        let mut entries = vec![
            SpecEntry::from_args("add", "(Tensor x, Tensor y)").unwrap(),
            SpecEntry::from_args("concat", "(Tensor[] x, Scalar axis)").unwrap(),
        ];
        let allow = AllowList::parse("- add\n- missing\n- add\n", Path::new("allow.yaml")).unwrap();
        assert_eq!(allow.names(), ["add", "missing"]);

        allow.apply(&mut entries);
        assert!(entries[0].is_eligible);
        assert!(!entries[1].is_eligible);
    }

    #[test]
    fn unlisted_declarations_need_not_parse() {
        let yaml = r#"
- op : full
  args : (IntArray shape, Scalar(double) value, Place place=CPUPlace())
- op : abs
  args : (Tensor x)
- op : exp
  args : (Tensor x)
"#;
        let declared = parse_declarations(yaml, Path::new("ops.yaml")).unwrap();
        assert_eq!(declared[0].args, "(IntArray shape, Scalar(double) value, Place place=CPUPlace())");

        let entries = AllowList::new(["abs"]).select(&declared).unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.is_eligible)).collect();
        assert_eq!(names, [("abs", true), ("exp", false)]);

        let err = AllowList::new(["full"]).select(&declared).unwrap_err();
        assert!(matches!(err, GenError::UnknownType { ref ty, .. } if ty == "Scalar(double)"));
    }
}
