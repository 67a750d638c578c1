//! List-expression expansion.
//!
//! Every element of the five list fields is an expression over task names:
//! `#` projects a list field out of another task, `*` replicates a list,
//! `+` concatenates, and parentheses group. Expressions are evaluated by an
//! operator-precedence machine with a value-list stack and an operator
//! stack; nothing recurses over the expression string itself.
//!
//! An element using only `#` splices its result in place. An element using
//! `+` or `*` is replaced by a synthesized `<owner>_DERIVED_<expr>`
//! JustReturn task carrying the result as `sub`, so every name left in a
//! list field is a valid task identifier.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uitask_task_model::{ListField, TaskInfo, TaskPayload};

use crate::error::{Error, Result};
use crate::store::{TaskStore, MAX_TASKS};

/// Operator precedence; higher binds tighter.
const fn precedence(op: u8) -> u8 {
    match op {
        b'+' => 0,
        b'*' => 1,
        _ => 2, // b'#'
    }
}

fn is_operator(byte: u8) -> bool {
    matches!(byte, b'+' | b'*' | b'#' | b'(' | b')')
}

/// What the scanner saw last, deciding whether an identifier slice is owed
/// to the value stack.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Operator,
    Open,
    Close,
}

impl TaskStore {
    /// Expand every list field of `old`, interning the resolved entity
    /// under `name` while the table is below [`MAX_TASKS`].
    pub(crate) fn expand(&mut self, name: &str, old: &Arc<TaskInfo>) -> Result<Arc<TaskInfo>> {
        let mut changed = false;
        let mut task = TaskInfo::clone(old);
        for field in ListField::ALL {
            let source = old.list(field).to_vec();
            let mut seen = HashSet::new();
            let mut out = Vec::with_capacity(source.len());
            self.expand_list(
                name,
                field,
                &source,
                field.allows_duplicates(),
                &mut seen,
                &mut out,
                &mut changed,
            )?;
            task.set_list(field, out);
        }

        let resolved = if changed {
            Arc::new(task)
        } else {
            Arc::clone(old)
        };
        if self.resolved.len() < MAX_TASKS {
            self.resolved
                .insert(name.to_string(), Arc::clone(&resolved));
        } else {
            debug!(
                "task count reached the {} cap, not interning '{}'",
                MAX_TASKS, name
            );
        }
        Ok(resolved)
    }

    /// Expand one list of expression elements into `out`.
    ///
    /// `multi` is the duplicate policy of the list being filled; `field`
    /// names the owner's list in errors. `seen` is shared across the whole
    /// field expansion, including `#` splices, so suppression carries over
    /// projection boundaries.
    fn expand_list(
        &mut self,
        owner: &str,
        field: ListField,
        source: &[String],
        multi: bool,
        seen: &mut HashSet<String>,
        out: &mut Vec<String>,
        changed: &mut bool,
    ) -> Result<()> {
        for entry in source {
            if entry.is_empty() {
                return Err(Error::EmptyListEntry {
                    name: owner.to_string(),
                    list: field.key(),
                });
            }
            if !multi && seen.contains(entry.as_str()) {
                *changed = true;
                continue;
            }
            seen.insert(entry.clone());

            if !entry.bytes().any(is_operator) {
                out.push(entry.clone());
                continue;
            }

            let (names, only_sharp) = self.eval_expr(owner, field, entry, seen, changed)?;
            *changed = true;
            if only_sharp {
                out.extend(names);
            } else {
                let derived_name = format!("{owner}_DERIVED_{entry}");
                let mut derived = TaskInfo::clone(self.defaults.base());
                derived.payload = TaskPayload::JustReturn;
                derived.name = derived_name.clone();
                derived.sub = names;
                debug!(
                    "created derived task '{}' with sub {:?}",
                    derived_name, derived.sub
                );
                self.raw.insert(derived_name.clone(), Arc::new(derived));
                out.push(derived_name);
            }
        }
        Ok(())
    }

    /// Evaluate one expression element; returns the name list and whether
    /// the expression used only `#` (and may therefore be spliced).
    fn eval_expr(
        &mut self,
        owner: &str,
        field: ListField,
        expr: &str,
        seen: &mut HashSet<String>,
        changed: &mut bool,
    ) -> Result<(Vec<String>, bool)> {
        let invalid = || Error::InvalidExpression {
            name: owner.to_string(),
            expr: expr.to_string(),
        };

        let mut values: Vec<Vec<String>> = Vec::new();
        let mut ops: Vec<u8> = Vec::new();
        let mut only_sharp = true;
        let mut start = 0;
        let mut prev = Prev::Start;

        for (i, byte) in expr.bytes().enumerate() {
            match byte {
                b'+' | b'*' | b'#' => {
                    if byte != b'#' {
                        only_sharp = false;
                    }
                    let segment = &expr[start..i];
                    if prev == Prev::Close {
                        // the parenthesized value is already on the stack
                        if !segment.is_empty() {
                            return Err(invalid());
                        }
                    } else {
                        values.push(vec![segment.to_string()]);
                    }
                    while let Some(&top) = ops.last() {
                        if top == b'(' || precedence(top) < precedence(byte) {
                            break;
                        }
                        ops.pop();
                        self.apply(owner, field, expr, top, &mut values, seen, changed)?;
                    }
                    ops.push(byte);
                    start = i + 1;
                    prev = Prev::Operator;
                }
                b'(' => {
                    if start != i || prev == Prev::Close {
                        return Err(invalid());
                    }
                    ops.push(b'(');
                    start = i + 1;
                    prev = Prev::Open;
                }
                b')' => {
                    let segment = &expr[start..i];
                    if prev == Prev::Close {
                        if !segment.is_empty() {
                            return Err(invalid());
                        }
                    } else {
                        values.push(vec![segment.to_string()]);
                    }
                    loop {
                        match ops.pop() {
                            Some(b'(') => break,
                            Some(op) => {
                                self.apply(owner, field, expr, op, &mut values, seen, changed)?;
                            }
                            None => return Err(invalid()),
                        }
                    }
                    start = i + 1;
                    prev = Prev::Close;
                }
                _ => {}
            }
        }

        let segment = &expr[start..];
        if prev == Prev::Close {
            if !segment.is_empty() {
                return Err(invalid());
            }
        } else {
            values.push(vec![segment.to_string()]);
        }
        while let Some(op) = ops.pop() {
            if op == b'(' {
                return Err(invalid());
            }
            self.apply(owner, field, expr, op, &mut values, seen, changed)?;
        }

        let result = values.pop().ok_or_else(invalid)?;
        if !values.is_empty() {
            return Err(invalid());
        }
        Ok((result, only_sharp))
    }

    /// Pop two operands and apply one operator.
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &mut self,
        owner: &str,
        field: ListField,
        expr: &str,
        op: u8,
        values: &mut Vec<Vec<String>>,
        seen: &mut HashSet<String>,
        changed: &mut bool,
    ) -> Result<()> {
        let invalid = || Error::InvalidExpression {
            name: owner.to_string(),
            expr: expr.to_string(),
        };
        let rhs = values.pop().ok_or_else(invalid)?;
        let lhs = values.pop().ok_or_else(invalid)?;

        let result = match op {
            b'+' => {
                let mut joined = lhs;
                joined.extend(rhs);
                joined
            }
            b'*' => {
                if rhs.len() != 1 {
                    return Err(invalid());
                }
                let times: i32 = rhs[0].parse().map_err(|_| invalid())?;
                let mut repeated = Vec::new();
                for _ in 0..times {
                    repeated.extend(lhs.iter().cloned());
                }
                repeated
            }
            b'#' => {
                if lhs.len() != 1 || rhs.len() != 1 {
                    return Err(invalid());
                }
                match rhs[0].as_str() {
                    "self" => vec![owner.to_string()],
                    // "A#back" is "A"; "#back" is nothing
                    "back" => {
                        if lhs[0].is_empty() {
                            Vec::new()
                        } else {
                            vec![lhs[0].clone()]
                        }
                    }
                    key => {
                        let projected = ListField::from_key(key).ok_or_else(invalid)?;
                        let other = if lhs[0].is_empty() {
                            Arc::clone(self.defaults.base())
                        } else {
                            self.get_raw(&lhs[0]).ok_or_else(|| Error::UnknownTask {
                                name: lhs[0].clone(),
                            })?
                        };
                        let source = other.list(projected).to_vec();
                        let mut spliced = Vec::new();
                        self.expand_list(
                            owner,
                            field,
                            &source,
                            projected.allows_duplicates(),
                            seen,
                            &mut spliced,
                            changed,
                        )?;
                        spliced
                    }
                }
            }
            _ => return Err(invalid()),
        };

        values.push(result);
        Ok(())
    }
}
