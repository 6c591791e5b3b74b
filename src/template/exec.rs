//! Executing a parsed [`Template`] against a root value.
//!
//! Output is accumulated into a buffer and only returned when the whole
//! template executed, so a failing render never yields partial text.

use super::ast::{Branch, Command, Node, Operand, Pipeline, Template};
use super::builtins;
use super::error::{Result, TemplateError};
use super::helpers::HelperLibrary;
use super::value::Value;

/// Printed for an action whose value is nil.
const NO_VALUE: &str = "<no value>";

/// Execute `template` with `root` as both dot and `$`.
pub(crate) fn execute(template: &Template, root: &Value, helpers: &HelperLibrary) -> Result<String> {
    let mut state = State {
        helpers,
        vars: vec![("$".to_string(), root.clone())],
        out: String::new(),
    };
    match state.walk(root, &template.nodes)? {
        Flow::Normal => Ok(state.out),
        // The parser rejects break/continue outside range.
        Flow::Break | Flow::Continue => Err(TemplateError::execution("break or continue outside range")),
    }
}

/// How control leaves a list of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
}

struct State<'a> {
    helpers: &'a HelperLibrary,
    /// Variable stack; `$` is always the first entry.
    vars: Vec<(String, Value)>,
    out: String,
}

impl State<'_> {
    fn walk(&mut self, dot: &Value, nodes: &[Node]) -> Result<Flow> {
        for node in nodes {
            let flow = match node {
                Node::Text(text) => {
                    self.out.push_str(text);
                    Flow::Normal
                }
                Node::Action(pipe) => {
                    let value = self.eval_pipeline(dot, pipe)?;
                    if pipe.decl.is_empty() {
                        self.print(&value);
                    }
                    Flow::Normal
                }
                Node::If(branch) => self.walk_if(dot, branch)?,
                Node::With(branch) => self.walk_with(dot, branch)?,
                Node::Range(branch) => self.walk_range(dot, branch)?,
                Node::Break => Flow::Break,
                Node::Continue => Flow::Continue,
            };
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Walk `nodes` in a fresh variable scope.
    fn walk_scoped(&mut self, dot: &Value, nodes: &[Node]) -> Result<Flow> {
        let mark = self.vars.len();
        let flow = self.walk(dot, nodes);
        self.vars.truncate(mark);
        flow
    }

    fn walk_if(&mut self, dot: &Value, branch: &Branch) -> Result<Flow> {
        let mark = self.vars.len();
        let condition = self.eval_pipeline(dot, &branch.pipe)?;
        let flow = if condition.is_truthy() {
            self.walk_scoped(dot, &branch.list)
        } else if let Some(else_list) = &branch.else_list {
            self.walk_scoped(dot, else_list)
        } else {
            Ok(Flow::Normal)
        };
        self.vars.truncate(mark);
        flow
    }

    fn walk_with(&mut self, dot: &Value, branch: &Branch) -> Result<Flow> {
        let mark = self.vars.len();
        let value = self.eval_pipeline(dot, &branch.pipe)?;
        let flow = if value.is_truthy() {
            self.walk_scoped(&value, &branch.list)
        } else if let Some(else_list) = &branch.else_list {
            self.walk_scoped(dot, else_list)
        } else {
            Ok(Flow::Normal)
        };
        self.vars.truncate(mark);
        flow
    }

    fn walk_range(&mut self, dot: &Value, branch: &Branch) -> Result<Flow> {
        let value = self.eval_commands(dot, &branch.pipe.cmds)?;
        let items: Vec<(Value, Value)> = match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::Int(i as i64), item))
                .collect(),
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, item)| (Value::String(key), item))
                .collect(),
            Value::Int(n) => (0..n.max(0)).map(|i| (Value::Int(i), Value::Int(i))).collect(),
            Value::Nil => Vec::new(),
            other => {
                return Err(TemplateError::execution(format!(
                    "range can't iterate over {}",
                    other.type_name()
                )));
            }
        };

        if items.is_empty() {
            return match &branch.else_list {
                Some(else_list) => self.walk_scoped(dot, else_list),
                None => Ok(Flow::Normal),
            };
        }

        let decl = &branch.pipe.decl;
        for (key, item) in items {
            let mark = self.vars.len();
            match decl.as_slice() {
                [] => {}
                [elem] => self.vars.push((elem.clone(), item.clone())),
                [index, elem, ..] => {
                    self.vars.push((index.clone(), key));
                    self.vars.push((elem.clone(), item.clone()));
                }
            }
            let flow = self.walk(&item, &branch.list);
            self.vars.truncate(mark);
            if flow? == Flow::Break {
                break;
            }
        }
        Ok(Flow::Normal)
    }

    fn print(&mut self, value: &Value) {
        match value {
            Value::Nil => self.out.push_str(NO_VALUE),
            other => self.out.push_str(&other.to_text()),
        }
    }

    fn eval_pipeline(&mut self, dot: &Value, pipe: &Pipeline) -> Result<Value> {
        let value = self.eval_commands(dot, &pipe.cmds)?;
        for name in &pipe.decl {
            if pipe.is_assign {
                self.assign(name, value.clone())?;
            } else {
                self.vars.push((name.clone(), value.clone()));
            }
        }
        Ok(value)
    }

    /// Run each command, feeding the previous result in as the final argument.
    fn eval_commands(&mut self, dot: &Value, cmds: &[Command]) -> Result<Value> {
        let mut piped = None;
        for cmd in cmds {
            piped = Some(self.eval_command(dot, cmd, piped)?);
        }
        Ok(piped.unwrap_or_default())
    }

    fn eval_command(&mut self, dot: &Value, cmd: &Command, piped: Option<Value>) -> Result<Value> {
        let Some((first, args)) = cmd.args.split_first() else {
            return Err(TemplateError::execution("empty command"));
        };

        match first {
            Operand::Function(name) => self.eval_function(dot, name, args, piped),
            Operand::Field(names) => self.eval_chain(dot, dot.clone(), names, args, piped),
            Operand::Variable { name, fields } => {
                let base = self.lookup(name)?;
                self.eval_chain(dot, base, fields, args, piped)
            }
            Operand::Pipe { pipe, fields } => {
                let base = self.eval_pipeline(dot, pipe)?;
                self.eval_chain(dot, base, fields, args, piped)
            }
            operand => {
                if !args.is_empty() || piped.is_some() {
                    return Err(TemplateError::execution(format!(
                        "can't give argument to non-function {}",
                        describe(operand)
                    )));
                }
                self.eval_arg(dot, operand)
            }
        }
    }

    /// Resolve `names` starting at `receiver`; the last step receives `args`.
    fn eval_chain(
        &mut self,
        dot: &Value,
        receiver: Value,
        names: &[String],
        args: &[Operand],
        piped: Option<Value>,
    ) -> Result<Value> {
        let Some((last, init)) = names.split_last() else {
            if !args.is_empty() || piped.is_some() {
                return Err(TemplateError::execution(format!(
                    "can't give argument to non-function {}",
                    receiver.type_name()
                )));
            }
            return Ok(receiver);
        };

        let mut current = receiver;
        for name in init {
            current = self.eval_field(dot, &current, name, &[], None)?;
        }
        self.eval_field(dot, &current, last, args, piped)
    }

    fn eval_field(
        &mut self,
        dot: &Value,
        receiver: &Value,
        name: &str,
        args: &[Operand],
        piped: Option<Value>,
    ) -> Result<Value> {
        if let Value::Object(object) = receiver
            && object.has_method(name)
        {
            let mut argv = self.eval_args(dot, args)?;
            argv.extend(piped);
            return object.call_method(name, &argv);
        }

        if !args.is_empty() || piped.is_some() {
            return Err(TemplateError::execution(format!(
                "{} has arguments but cannot be invoked as function",
                name
            )));
        }
        receiver.field(name)
    }

    fn eval_function(
        &mut self,
        dot: &Value,
        name: &str,
        args: &[Operand],
        piped: Option<Value>,
    ) -> Result<Value> {
        if builtins::LAZY.contains(&name) {
            return self.eval_lazy(dot, name, args, piped);
        }

        let function = builtins::lookup(name)
            .or_else(|| self.helpers.get(name))
            .ok_or_else(|| TemplateError::execution(format!("function \"{}\" not defined", name)))?;
        let mut argv = self.eval_args(dot, args)?;
        argv.extend(piped);
        function(&argv)
    }

    /// `and` stops at the first falsy operand and `or` at the first truthy
    /// one; later operands are never evaluated.
    fn eval_lazy(
        &mut self,
        dot: &Value,
        name: &str,
        args: &[Operand],
        piped: Option<Value>,
    ) -> Result<Value> {
        if args.is_empty() && piped.is_none() {
            return Err(TemplateError::execution(format!(
                "wrong number of args for {}: want at least 1 got 0",
                name
            )));
        }

        let stop_on = name == "or";
        let mut result = Value::Nil;
        for arg in args {
            result = self.eval_arg(dot, arg)?;
            if result.is_truthy() == stop_on {
                return Ok(result);
            }
        }
        Ok(piped.unwrap_or(result))
    }

    fn eval_args(&mut self, dot: &Value, args: &[Operand]) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.eval_arg(dot, arg)).collect()
    }

    fn eval_arg(&mut self, dot: &Value, operand: &Operand) -> Result<Value> {
        match operand {
            Operand::Dot => Ok(dot.clone()),
            Operand::Nil => Ok(Value::Nil),
            Operand::Bool(b) => Ok(Value::Bool(*b)),
            Operand::Int(i) => Ok(Value::Int(*i)),
            Operand::Float(f) => Ok(Value::Float(*f)),
            Operand::String(s) => Ok(Value::String(s.clone())),
            Operand::Field(names) => self.eval_chain(dot, dot.clone(), names, &[], None),
            Operand::Variable { name, fields } => {
                let base = self.lookup(name)?;
                self.eval_chain(dot, base, fields, &[], None)
            }
            Operand::Function(name) => self.eval_function(dot, name, &[], None),
            Operand::Pipe { pipe, fields } => {
                let base = self.eval_pipeline(dot, pipe)?;
                self.eval_chain(dot, base, fields, &[], None)
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        self.vars
            .iter()
            .rev()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| TemplateError::execution(format!("undefined variable: {}", name)))
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<()> {
        match self.vars.iter_mut().rev().find(|(var, _)| var == name) {
            Some(slot) => {
                slot.1 = value;
                Ok(())
            }
            None => Err(TemplateError::execution(format!("undefined variable: {}", name))),
        }
    }
}

fn describe(operand: &Operand) -> String {
    match operand {
        Operand::Dot => ".".to_string(),
        Operand::Nil => "nil".to_string(),
        Operand::Bool(b) => b.to_string(),
        Operand::Int(i) => i.to_string(),
        Operand::Float(f) => f.to_string(),
        Operand::String(s) => format!("{:?}", s),
        other => format!("{:?}", other),
    }
}
