//! Static discovery of the path labels a router can return.
//!
//! Router bodies are parsed with `syn` and never executed. The result is an
//! over-approximation: a return that indexes a literal mapping contributes
//! every string value of that mapping, whichever key is used at runtime.
//!
//! Recognized shapes:
//! - string literals, optionally wrapped in `.to_string()`, `.to_owned()`,
//!   `.into()`, `.clone()` or `String::from(..)`
//! - mappings bound with `let` (or plain assignment) to `Map::from([(k, v), ..])`,
//!   `Map::from_iter([..])`, `[(k, v), ..].into_iter().collect()`,
//!   `[(k, v), ..].into()` or a bare array of pairs
//! - `return` operands and tail expressions, descending through `if`/`else`,
//!   `match` arms and nested blocks in either position
//!
//! Closures and nested items have their own returns and are skipped.

use std::collections::{BTreeSet, HashMap};
use syn::visit::{self, Visit};
use syn::{
    Block, Expr, ExprArray, ExprAssign, ExprClosure, ExprReturn, ImplItem, Item, Lit, Local, Pat,
    Stmt,
};

/// Methods that turn a string or a mapping lookup into an owned label
const CONVERSIONS: &[&str] = &["to_string", "to_owned", "into", "clone"];

/// Enumerate the string labels a router's source can return.
///
/// `source` is either one or more Rust functions (free functions or methods
/// inside an `impl` block) or a bare function body. Returns `None` when the
/// source does not parse or no label can be found.
pub fn extract_possible_outcomes(source: &str) -> Option<BTreeSet<String>> {
    let bodies = match parse_router(source) {
        Ok(bodies) => bodies,
        Err(e) => {
            tracing::debug!("Failed to parse router source: {}", e);
            return None;
        }
    };

    // First pass: literal mappings, second pass: returns
    let mut mappings = MappingCollector::default();
    for body in &bodies {
        mappings.visit_block(body);
    }

    let mut returns = ReturnCollector {
        mappings: &mappings.mappings,
        outcomes: BTreeSet::new(),
    };
    for body in &bodies {
        returns.visit_block(body);
        returns.contribute_tail(body);
    }

    if returns.outcomes.is_empty() {
        None
    } else {
        Some(returns.outcomes)
    }
}

fn parse_router(source: &str) -> syn::Result<Vec<Block>> {
    if let Ok(file) = syn::parse_file(source) {
        let bodies = function_bodies(file.items);
        if !bodies.is_empty() {
            return Ok(bodies);
        }
    }

    let block: Block = syn::parse_str(&format!("{{\n{source}\n}}"))?;
    Ok(vec![block])
}

fn function_bodies(items: Vec<Item>) -> Vec<Block> {
    let mut bodies = Vec::new();
    for item in items {
        match item {
            Item::Fn(f) => bodies.push(*f.block),
            Item::Impl(imp) => {
                for impl_item in imp.items {
                    if let ImplItem::Fn(method) = impl_item {
                        bodies.push(method.block);
                    }
                }
            }
            _ => {}
        }
    }
    bodies
}

/// Records `name -> string values` for every literal mapping binding
#[derive(Default)]
struct MappingCollector {
    mappings: HashMap<String, Vec<String>>,
}

impl MappingCollector {
    fn record(&mut self, name: String, expr: &Expr) {
        if let Some(values) = mapping_values(expr) {
            // Bindings without any string value are dropped
            if !values.is_empty() {
                self.mappings.insert(name, values);
            }
        }
    }
}

impl<'ast> Visit<'ast> for MappingCollector {
    fn visit_local(&mut self, node: &'ast Local) {
        if let (Some(name), Some(init)) = (binding_name(&node.pat), &node.init) {
            self.record(name, &init.expr);
        }
        visit::visit_local(self, node);
    }

    fn visit_expr_assign(&mut self, node: &'ast ExprAssign) {
        if let Some(name) = path_ident(&node.left) {
            self.record(name, &node.right);
        }
        visit::visit_expr_assign(self, node);
    }

    fn visit_expr_closure(&mut self, _node: &'ast ExprClosure) {}

    fn visit_item(&mut self, _node: &'ast Item) {}
}

struct ReturnCollector<'m> {
    mappings: &'m HashMap<String, Vec<String>>,
    outcomes: BTreeSet<String>,
}

impl ReturnCollector<'_> {
    fn contribute(&mut self, expr: &Expr) {
        if let Some(label) = string_literal(expr) {
            self.outcomes.insert(label);
            return;
        }

        let mappings = self.mappings;
        if let Expr::Index(index) = strip_conversions(expr) {
            if let Some(values) = path_ident(&index.expr).and_then(|n| mappings.get(&n)) {
                self.outcomes.extend(values.iter().cloned());
            }
        }
    }

    fn contribute_tail(&mut self, block: &Block) {
        if let Some(Stmt::Expr(expr, None)) = block.stmts.last() {
            self.contribute_tail_expr(expr);
        }
    }

    fn contribute_tail_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::If(e) => {
                self.contribute_tail(&e.then_branch);
                if let Some((_, otherwise)) = &e.else_branch {
                    self.contribute_tail_expr(otherwise);
                }
            }
            Expr::Match(e) => {
                for arm in &e.arms {
                    self.contribute_tail_expr(&arm.body);
                }
            }
            Expr::Block(e) => self.contribute_tail(&e.block),
            // Already seen by the visitor
            Expr::Return(_) => {}
            other => self.contribute(other),
        }
    }
}

impl<'ast> Visit<'ast> for ReturnCollector<'_> {
    fn visit_expr_return(&mut self, node: &'ast ExprReturn) {
        if let Some(expr) = &node.expr {
            self.contribute_tail_expr(expr);
        }
        visit::visit_expr_return(self, node);
    }

    fn visit_expr_closure(&mut self, _node: &'ast ExprClosure) {}

    fn visit_item(&mut self, _node: &'ast Item) {}
}

fn binding_name(pat: &Pat) -> Option<String> {
    match pat {
        Pat::Ident(p) => Some(p.ident.to_string()),
        Pat::Type(p) => binding_name(&p.pat),
        _ => None,
    }
}

fn path_ident(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Path(p) => p.path.get_ident().map(|i| i.to_string()),
        _ => None,
    }
}

/// Peel parentheses, references and string conversions off an expression
fn strip_conversions(mut expr: &Expr) -> &Expr {
    loop {
        expr = match expr {
            Expr::Paren(e) => &*e.expr,
            Expr::Group(e) => &*e.expr,
            Expr::Reference(e) => &*e.expr,
            Expr::MethodCall(e)
                if e.args.is_empty() && CONVERSIONS.iter().any(|m| e.method == *m) =>
            {
                &*e.receiver
            }
            Expr::Call(e) if e.args.len() == 1 && path_ends_with(&e.func, &["String", "from"]) => {
                &e.args[0]
            }
            _ => return expr,
        };
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    match strip_conversions(expr) {
        Expr::Lit(e) => match &e.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}

/// String values of a literal mapping, or `None` if `expr` is not one
fn mapping_values(expr: &Expr) -> Option<Vec<String>> {
    match strip_conversions(expr) {
        Expr::Array(array) => pair_values(array),
        Expr::Call(call)
            if call.args.len() == 1
                && (path_ends_with(&call.func, &["from"])
                    || path_ends_with(&call.func, &["from_iter"])) =>
        {
            mapping_values(&call.args[0])
        }
        Expr::MethodCall(collect) if collect.method == "collect" && collect.args.is_empty() => {
            match strip_conversions(&collect.receiver) {
                Expr::MethodCall(iter) if iter.method == "into_iter" && iter.args.is_empty() => {
                    mapping_values(&iter.receiver)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn pair_values(array: &ExprArray) -> Option<Vec<String>> {
    let mut values = Vec::new();
    for elem in &array.elems {
        let Expr::Tuple(pair) = elem else {
            return None;
        };
        if pair.elems.len() != 2 {
            return None;
        }
        if let Some(value) = string_literal(&pair.elems[1]) {
            values.push(value);
        }
    }
    Some(values)
}

fn path_ends_with(expr: &Expr, suffix: &[&str]) -> bool {
    let Expr::Path(p) = expr else {
        return false;
    };
    let segments: Vec<String> = p.path.segments.iter().map(|s| s.ident.to_string()).collect();
    segments.len() >= suffix.len()
        && segments[segments.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}
