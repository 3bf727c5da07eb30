//! Expression graph values and their JSON encoding.
//!
//! The remote service evaluates a graph of values. A value is either a
//! constant, an invocation of a named server-side function, an array, a
//! dictionary, a reference to a mapping function argument, or a function
//! definition used as the body of a `map` call.
//!
//! # Wire Format
//!
//! ```text
//! {
//!   "result": "0",
//!   "values": {
//!     "0": { "functionInvocationValue": { "functionName": "...", "arguments": {...} } },
//!     "1": ...                           // shared sub-expressions
//!   }
//! }
//! ```
//!
//! Invocations that appear more than once in the tree are hoisted into the
//! `values` table and referenced with `valueReference`. Nodes that mention a
//! mapping argument are never hoisted since they are only meaningful inside
//! their function definition.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Map, Value};

/// A node in the expression graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal JSON value (number, string, bool, null).
    Constant(Value),
    /// Call of a server-side algorithm with named arguments.
    Invocation {
        function: String,
        args: BTreeMap<String, Expr>,
    },
    /// An ordered list of values.
    Array(Vec<Expr>),
    /// A string-keyed dictionary of values.
    Dictionary(BTreeMap<String, Expr>),
    /// Reference to a parameter of the enclosing function definition.
    ArgumentRef(String),
    /// A lambda passed to collection `map` style algorithms.
    FunctionDef { params: Vec<String>, body: Box<Expr> },
}

impl Expr {
    /// Creates a constant node from anything convertible to JSON.
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    /// Creates a constant string node.
    pub fn string(value: impl Into<String>) -> Self {
        Expr::Constant(Value::String(value.into()))
    }

    /// Creates an array of string constants.
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::Array(values.into_iter().map(Expr::string).collect())
    }

    /// Starts an invocation of `function` with no arguments.
    pub fn call(function: impl Into<String>) -> Invocation {
        Invocation {
            function: function.into(),
            args: BTreeMap::new(),
        }
    }

    /// Returns true if this node references a mapping argument it does not bind itself.
    pub fn references_argument(&self) -> bool {
        self.has_free_argument(&mut Vec::new())
    }

    fn has_free_argument<'a>(&'a self, bound: &mut Vec<&'a str>) -> bool {
        match self {
            Expr::Constant(_) => false,
            Expr::ArgumentRef(name) => !bound.contains(&name.as_str()),
            Expr::Invocation { args, .. } => args.values().any(|e| e.has_free_argument(bound)),
            Expr::Array(items) => items.iter().any(|e| e.has_free_argument(bound)),
            Expr::Dictionary(items) => items.values().any(|e| e.has_free_argument(bound)),
            Expr::FunctionDef { params, body } => {
                let outer = bound.len();
                bound.extend(params.iter().map(String::as_str));
                let free = body.has_free_argument(bound);
                bound.truncate(outer);
                free
            }
        }
    }

    /// Encodes this expression as a complete request graph.
    pub fn to_graph(&self) -> Value {
        GraphEncoder::new(self).encode(self)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::string(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::string(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::constant(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::constant(value)
    }
}

/// Builder for an [`Expr::Invocation`].
#[derive(Debug, Clone)]
pub struct Invocation {
    function: String,
    args: BTreeMap<String, Expr>,
}

impl Invocation {
    /// Adds a named argument.
    pub fn arg(mut self, name: &str, value: impl Into<Expr>) -> Self {
        self.args.insert(name.to_string(), value.into());
        self
    }

    /// Adds a named argument only when `value` is present.
    pub fn opt_arg(self, name: &str, value: Option<impl Into<Expr>>) -> Self {
        match value {
            Some(v) => self.arg(name, v),
            None => self,
        }
    }

    /// Finishes the invocation node.
    pub fn build(self) -> Expr {
        Expr::Invocation {
            function: self.function,
            args: self.args,
        }
    }
}

impl From<Invocation> for Expr {
    fn from(invocation: Invocation) -> Self {
        invocation.build()
    }
}

thread_local! {
    static MAPPING_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Builds a single-parameter function definition.
///
/// The parameter is named after the current nesting depth so that a mapping
/// function defined inside another one never shadows the outer parameter,
/// and so the same pipeline always encodes to the same graph.
pub fn function_def(body: impl FnOnce(Expr) -> Expr) -> Expr {
    let depth = MAPPING_DEPTH.with(|d| {
        let depth = d.get();
        d.set(depth + 1);
        depth
    });
    let param = format!("_MAPPING_VAR_{}_0", depth);
    let result = body(Expr::ArgumentRef(param.clone()));
    MAPPING_DEPTH.with(|d| d.set(depth));

    Expr::FunctionDef {
        params: vec![param],
        body: Box::new(result),
    }
}

/// Two-pass encoder: count shared invocations, then emit.
struct GraphEncoder {
    counts: HashMap<String, usize>,
    values: Map<String, Value>,
    hoisted: HashMap<String, String>,
}

impl GraphEncoder {
    fn new(root: &Expr) -> Self {
        let mut counts = HashMap::new();
        count_invocations(root, &mut counts);
        Self {
            counts,
            values: Map::new(),
            hoisted: HashMap::new(),
        }
    }

    fn encode(mut self, root: &Expr) -> Value {
        // Reserve "0" for the result so shared values get stable ids after it.
        self.values.insert("0".to_string(), Value::Null);
        let result = self.encode_node(root, true);
        self.values.insert("0".to_string(), result);
        json!({ "result": "0", "values": Value::Object(self.values) })
    }

    fn encode_node(&mut self, expr: &Expr, is_root: bool) -> Value {
        match expr {
            Expr::Constant(v) => json!({ "constantValue": v }),
            Expr::ArgumentRef(name) => json!({ "argumentReference": name }),
            Expr::Array(items) => {
                let values: Vec<Value> = items.iter().map(|e| self.encode_node(e, false)).collect();
                json!({ "arrayValue": { "values": values } })
            }
            Expr::Dictionary(items) => {
                let mut values = Map::new();
                for (k, v) in items {
                    values.insert(k.clone(), self.encode_node(v, false));
                }
                json!({ "dictionaryValue": { "values": values } })
            }
            Expr::FunctionDef { params, body } => {
                let body = self.encode_node(body, false);
                json!({ "functionDefinitionValue": { "argumentNames": params, "body": body } })
            }
            Expr::Invocation { function, args } => {
                let key = canonical_key(expr);
                if !is_root {
                    if let Some(id) = self.hoisted.get(&key) {
                        return json!({ "valueReference": id });
                    }
                }

                let mut arguments = Map::new();
                for (k, v) in args {
                    arguments.insert(k.clone(), self.encode_node(v, false));
                }
                let encoded = json!({
                    "functionInvocationValue": {
                        "functionName": function,
                        "arguments": arguments,
                    }
                });

                let shared = self.counts.get(&key).copied().unwrap_or(0) > 1;
                if is_root || !shared || expr.references_argument() {
                    return encoded;
                }

                let id = self.values.len().to_string();
                self.values.insert(id.clone(), encoded);
                self.hoisted.insert(key, id.clone());
                json!({ "valueReference": id })
            }
        }
    }
}

fn count_invocations(expr: &Expr, counts: &mut HashMap<String, usize>) {
    match expr {
        Expr::Constant(_) | Expr::ArgumentRef(_) => {}
        Expr::Array(items) => items.iter().for_each(|e| count_invocations(e, counts)),
        Expr::Dictionary(items) => items.values().for_each(|e| count_invocations(e, counts)),
        Expr::FunctionDef { body, .. } => count_invocations(body, counts),
        Expr::Invocation { args, .. } => {
            let entry = counts.entry(canonical_key(expr)).or_insert(0);
            *entry += 1;
            // Children of a repeated node are only counted once.
            if *entry == 1 {
                args.values().for_each(|e| count_invocations(e, counts));
            }
        }
    }
}

/// Structural key for an expression; equal trees produce equal keys.
fn canonical_key(expr: &Expr) -> String {
    fn plain(expr: &Expr) -> Value {
        match expr {
            Expr::Constant(v) => json!({ "c": v }),
            Expr::ArgumentRef(n) => json!({ "a": n }),
            Expr::Array(items) => Value::Array(items.iter().map(plain).collect()),
            Expr::Dictionary(items) => {
                let m: Map<String, Value> =
                    items.iter().map(|(k, v)| (k.clone(), plain(v))).collect();
                json!({ "d": m })
            }
            Expr::FunctionDef { params, body } => json!({ "f": params, "b": plain(body) }),
            Expr::Invocation { function, args } => {
                let m: Map<String, Value> =
                    args.iter().map(|(k, v)| (k.clone(), plain(v))).collect();
                json!({ "i": function, "args": m })
            }
        }
    }
    plain(expr).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(id: &str) -> Expr {
        Expr::call("ImageCollection.load").arg("id", id).build()
    }

    #[test]
    fn test_constant_root_encoding() {
        let graph = Expr::constant(5).to_graph();
        assert_eq!(graph["result"], "0");
        assert_eq!(graph["values"]["0"]["constantValue"], 5);
    }

    #[test]
    fn test_invocation_encoding() {
        let graph = load("MODIS/061/MYD11A1").to_graph();
        let inv = &graph["values"]["0"]["functionInvocationValue"];
        assert_eq!(inv["functionName"], "ImageCollection.load");
        assert_eq!(inv["arguments"]["id"]["constantValue"], "MODIS/061/MYD11A1");
    }

    #[test]
    fn test_shared_invocation_is_hoisted() {
        let shared = load("a");
        let root = Expr::call("Collection.merge")
            .arg("collection1", shared.clone())
            .arg("collection2", shared)
            .build();

        let graph = root.to_graph();
        let values = graph["values"].as_object().unwrap();
        assert_eq!(values.len(), 2);

        let args = &graph["values"]["0"]["functionInvocationValue"]["arguments"];
        assert_eq!(args["collection1"]["valueReference"], "1");
        assert_eq!(args["collection2"]["valueReference"], "1");
        assert_eq!(
            graph["values"]["1"]["functionInvocationValue"]["functionName"],
            "ImageCollection.load"
        );
    }

    #[test]
    fn test_single_use_invocation_stays_inline() {
        let root = Expr::call("Collection.first").arg("collection", load("a")).build();
        let graph = root.to_graph();
        assert_eq!(graph["values"].as_object().unwrap().len(), 1);
        let inner = &graph["values"]["0"]["functionInvocationValue"]["arguments"]["collection"];
        assert!(inner.get("functionInvocationValue").is_some());
    }

    #[test]
    fn test_argument_nodes_are_not_hoisted() {
        let def = function_def(|img| {
            let sel = Expr::call("Image.select").arg("input", img).build();
            Expr::call("Image.add")
                .arg("image1", sel.clone())
                .arg("image2", sel)
                .build()
        });
        let graph = Expr::call("Collection.map")
            .arg("collection", load("a"))
            .arg("baseAlgorithm", def)
            .build()
            .to_graph();
        assert_eq!(graph["values"].as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_nested_mapping_parameters_are_distinct() {
        let mut inner_name = String::new();
        let outer = function_def(|outer_arg| {
            let inner = function_def(|inner_arg| inner_arg);
            if let Expr::FunctionDef { params, .. } = &inner {
                inner_name = params[0].clone();
            }
            Expr::Array(vec![outer_arg, inner])
        });

        match outer {
            Expr::FunctionDef { params, .. } => {
                assert_eq!(params[0], "_MAPPING_VAR_0_0");
                assert_eq!(inner_name, "_MAPPING_VAR_1_0");
            }
            _ => panic!("Expected function definition"),
        }

        // Depth is restored once the outer definition completes.
        if let Expr::FunctionDef { params, .. } = function_def(|a| a) {
            assert_eq!(params[0], "_MAPPING_VAR_0_0");
        }
    }

    #[test]
    fn test_references_argument() {
        assert!(Expr::ArgumentRef("x".into()).references_argument());
        assert!(!load("a").references_argument());
        let def = function_def(|a| a);
        assert!(!def.references_argument());

        let mut inner = Expr::Constant(Value::Null);
        let _outer = function_def(|outer_arg| {
            inner = function_def(|_| outer_arg.clone());
            outer_arg
        });
        assert!(inner.references_argument());
    }

    #[test]
    fn test_captured_argument_is_not_hoisted() {
        let outer = function_def(|outer_arg| {
            let tagged = Expr::call("Collection.map")
                .arg("collection", Expr::call("FeatureCollection.load").arg("id", "x").build())
                .arg(
                    "baseAlgorithm",
                    function_def(|f| {
                        Expr::call("Element.set")
                            .arg("object", f)
                            .arg("key", "date")
                            .arg(
                                "value",
                                Expr::call("Element.get")
                                    .arg("object", outer_arg.clone())
                                    .arg("property", "system:time_start")
                                    .build(),
                            )
                            .build()
                    }),
                )
                .build();
            Expr::call("Collection.merge")
                .arg("collection1", tagged.clone())
                .arg("collection2", tagged)
                .build()
        });
        let graph = Expr::call("Collection.map")
            .arg("collection", load("a"))
            .arg("baseAlgorithm", outer)
            .build()
            .to_graph();

        assert_eq!(graph["values"].as_object().unwrap().len(), 1);
        assert!(!graph.to_string().contains("valueReference"));
    }

    #[test]
    fn test_opt_arg_skips_none() {
        let e = Expr::call("Export").opt_arg("selectors", None::<Expr>).build();
        match e {
            Expr::Invocation { args, .. } => assert!(args.is_empty()),
            _ => panic!("Expected invocation"),
        }
    }
}
