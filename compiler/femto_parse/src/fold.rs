//! Bottom-up constant folding over syntactic expressions.

use crate::Parser;
use femto_ir::ast::{Decl, Expr, OpKind, ParsedTypeKind, ScopeId};
use femto_ir::{Literal, LiteralKind};

impl Parser<'_> {
    /// Fold an expression bottom-up.
    ///
    /// Operands that fold are replaced in place by literal nodes; when the
    /// node itself reduces, its literal is returned and the caller replaces
    /// the whole tree. Division by zero and out-of-range shifts are fatal
    /// diagnostics and stop folding that subtree. Folding is idempotent:
    /// literals fold to themselves.
    pub(crate) fn fold_node(&self, e: &mut Expr, m: usize, scope: ScopeId) -> Option<Literal> {
        match e {
            Expr::Literal { value, .. } => Some(value.clone()),
            Expr::Name { name, .. } => self.modules[m].find_literal_from(scope, name),
            Expr::Op { .. } => self.fold_op(e, m, scope),
            _ => None,
        }
    }

    fn fold_op(&self, e: &mut Expr, m: usize, scope: ScopeId) -> Option<Literal> {
        // Dot chains fold through the module table, not through operands.
        if let Expr::Op {
            op: OpKind::Dot, ..
        } = e
        {
            return self.fold_dot(e, m);
        }

        let Expr::Op {
            loc,
            op,
            type_operand,
            operand0,
            operand1,
            operand2,
        } = e
        else {
            return None;
        };
        let loc = *loc;

        // fold operands first, replacing folded subtrees with literals
        let mut fold_slot = |slot: &mut Option<Box<Expr>>| -> Option<Literal> {
            let sub = slot.as_deref_mut()?;
            let lit = self.fold_node(sub, m, scope)?;
            *sub = Expr::Literal {
                loc: sub.loc(),
                value: lit.clone(),
            };
            Some(lit)
        };
        let o0 = fold_slot(operand0);
        let o1 = fold_slot(operand1);
        let o2 = fold_slot(operand2);

        let same_kind = |a: &Literal, b: &Literal| a.kind() == b.kind();

        match op {
            OpKind::Plus => match o0? {
                v @ (Literal::Int(_) | Literal::Float(_)) => Some(v),
                _ => None,
            },
            OpKind::Minus => match o0? {
                Literal::Int(v) => Some(Literal::Int(v.wrapping_neg())),
                Literal::Float(v) => Some(Literal::Float(-v)),
                _ => None,
            },
            OpKind::LogicNot => match o0? {
                Literal::Bool(v) => Some(Literal::Bool(!v)),
                _ => None,
            },
            OpKind::BitNot => match o0? {
                Literal::Int(v) => Some(Literal::Int(!v)),
                _ => None,
            },

            OpKind::Mul | OpKind::Add | OpKind::Sub => {
                let (a, b) = (o0?, o1?);
                if !same_kind(&a, &b) {
                    return None;
                }
                match (a, b) {
                    (Literal::Int(x), Literal::Int(y)) => Some(Literal::Int(match op {
                        OpKind::Mul => x.wrapping_mul(y),
                        OpKind::Add => x.wrapping_add(y),
                        _ => x.wrapping_sub(y),
                    })),
                    (Literal::Float(x), Literal::Float(y)) => Some(Literal::Float(match op {
                        OpKind::Mul => x * y,
                        OpKind::Add => x + y,
                        _ => x - y,
                    })),
                    _ => None,
                }
            }

            OpKind::Div => {
                let (a, b) = (o0?, o1?);
                if !same_kind(&a, &b) {
                    return None;
                }
                match (a, b) {
                    (Literal::Int(x), Literal::Int(y)) => {
                        if y == 0 {
                            self.reporter().fatal(&format!(
                                "E0210 division by zero at {}",
                                self.reporter().loc(loc)
                            ));
                            return None;
                        }
                        Some(Literal::Int(x.wrapping_div(y)))
                    }
                    (Literal::Float(x), Literal::Float(y)) => {
                        if y == 0.0 {
                            self.reporter().fatal(&format!(
                                "E0211 division by zero at {}",
                                self.reporter().loc(loc)
                            ));
                            return None;
                        }
                        Some(Literal::Float(x / y))
                    }
                    _ => None,
                }
            }

            OpKind::Mod => {
                let (a, b) = (o0?, o1?);
                match (a, b) {
                    (Literal::Int(x), Literal::Int(y)) => {
                        if y == 0 {
                            self.reporter().fatal(&format!(
                                "E0212 modulo by zero at {}",
                                self.reporter().loc(loc)
                            ));
                            return None;
                        }
                        Some(Literal::Int(x.wrapping_rem(y)))
                    }
                    _ => None,
                }
            }

            OpKind::Shl | OpKind::Shr => {
                let (a, b) = (o0?, o1?);
                match (a, b) {
                    (Literal::Int(x), Literal::Int(sh)) => {
                        if !(0..=63).contains(&sh) {
                            let code = if *op == OpKind::Shl { "E0213" } else { "E0214" };
                            self.reporter().fatal(&format!(
                                "{code} shift({sh}) out of range at {}",
                                self.reporter().loc(loc)
                            ));
                            return None;
                        }
                        Some(Literal::Int(if *op == OpKind::Shl {
                            x << sh
                        } else {
                            x >> sh
                        }))
                    }
                    _ => None,
                }
            }

            OpKind::Lt | OpKind::Le | OpKind::Gt | OpKind::Ge => {
                let (a, b) = (o0?, o1?);
                if !same_kind(&a, &b) {
                    return None;
                }
                let r = match (a, b) {
                    (Literal::Int(x), Literal::Int(y)) => match op {
                        OpKind::Lt => x < y,
                        OpKind::Le => x <= y,
                        OpKind::Gt => x > y,
                        _ => x >= y,
                    },
                    (Literal::Float(x), Literal::Float(y)) => match op {
                        OpKind::Lt => x < y,
                        OpKind::Le => x <= y,
                        OpKind::Gt => x > y,
                        _ => x >= y,
                    },
                    _ => return None,
                };
                Some(Literal::Bool(r))
            }

            OpKind::Eq | OpKind::Ne => {
                let (a, b) = (o0?, o1?);
                if !same_kind(&a, &b) {
                    return None;
                }
                let eq = match (&a, &b) {
                    (Literal::Int(x), Literal::Int(y)) => x == y,
                    (Literal::Float(x), Literal::Float(y)) => x == y,
                    (Literal::Bool(x), Literal::Bool(y)) => x == y,
                    (Literal::Null, Literal::Null) => true,
                    _ => return None,
                };
                Some(Literal::Bool(if *op == OpKind::Eq { eq } else { !eq }))
            }

            OpKind::BitAnd | OpKind::BitXor | OpKind::BitOr => {
                let (a, b) = (o0?, o1?);
                match (a, b) {
                    (Literal::Int(x), Literal::Int(y)) => Some(Literal::Int(match op {
                        OpKind::BitAnd => x & y,
                        OpKind::BitXor => x ^ y,
                        _ => x | y,
                    })),
                    _ => None,
                }
            }

            OpKind::LogicAnd | OpKind::LogicOr => {
                let (a, b) = (o0?, o1?);
                match (a, b) {
                    (Literal::Bool(x), Literal::Bool(y)) => Some(Literal::Bool(
                        if *op == OpKind::LogicAnd { x && y } else { x || y },
                    )),
                    _ => None,
                }
            }

            OpKind::Cond => {
                let (c, a, b) = (o0?, o1?, o2?);
                if !same_kind(&a, &b) {
                    return None;
                }
                match c {
                    Literal::Bool(true) => Some(a),
                    Literal::Bool(false) => Some(b),
                    _ => None,
                }
            }

            OpKind::Sizeof => {
                if let Some(lit) = o0 {
                    let size = match lit.kind() {
                        LiteralKind::Int | LiteralKind::Float => 8,
                        LiteralKind::Bool => 1,
                        LiteralKind::Str => self.arch * 2,
                        LiteralKind::Null => self.arch,
                    };
                    return Some(Literal::Int(size));
                }
                let ty = type_operand.as_deref()?;
                let size = match ty.kind {
                    ParsedTypeKind::Primitive => ty.size,
                    ParsedTypeKind::Ptr | ParsedTypeKind::Func => self.arch,
                    ParsedTypeKind::Arr => {
                        if ty.size > 0 {
                            ty.size
                        } else {
                            return None;
                        }
                    }
                    ParsedTypeKind::Slice => self.arch * 2,
                    // named struct/enum sizes resolve through the module
                    // table once pass 2 has completed them
                    ParsedTypeKind::Name => self.named_type_size(&ty.src_uname, &ty.name)?,
                    ParsedTypeKind::Foreign => {
                        let pos = self.find_module(&ty.src_uname)?;
                        let inc = self.modules[pos].find_decl(&ty.inc_name, false)?;
                        let Decl::Include { tgt_uname, .. } = self.modules[pos].decl(inc) else {
                            return None;
                        };
                        self.named_type_size(&tgt_uname.clone(), &ty.name)?
                    }
                    ParsedTypeKind::Auto => return None,
                };
                Some(Literal::Int(size))
            }

            // never foldable
            OpKind::Dot
            | OpKind::Index
            | OpKind::Slice
            | OpKind::Ref
            | OpKind::Deref
            | OpKind::Inc
            | OpKind::Dec
            | OpKind::Cast
            | OpKind::Make
            | OpKind::Len
            | OpKind::Move => None,
        }
    }

    /// Resolved size of a struct or enum by name, if sizing completed.
    fn named_type_size(&self, uname: &str, name: &str) -> Option<i64> {
        let pos = self.find_module(uname)?;
        let id = self.modules[pos].find_decl(name, false)?;
        let size = match self.modules[pos].decl(id) {
            Decl::Struct(s) => s.ty.size,
            Decl::Enum(e) => e.ty.size,
            _ => return None,
        };
        (size > 0).then_some(size)
    }

    /// Fold the three dot shapes: `Enum.Member`, `Include.Name`, and
    /// `Include.Enum.Member`, all through the module table.
    fn fold_dot(&self, e: &Expr, m: usize) -> Option<Literal> {
        let Expr::Op {
            operand0: Some(lhs),
            operand1: Some(rhs),
            ..
        } = e
        else {
            return None;
        };
        let name0 = lhs.as_name()?;
        let module = &self.modules[m];
        let decl_id = module.find_decl(name0, false)?;
        match module.decl(decl_id) {
            Decl::Enum(_) => {
                let name1 = rhs.as_name()?;
                module.find_literal(&format!("{name0}.{name1}"), false)
            }
            Decl::Include { tgt_path, .. } => {
                let pos = self.find_module_by_path(tgt_path)?;
                match rhs.as_ref() {
                    Expr::Name { name: name1, .. } => {
                        self.modules[pos].find_literal(name1, true)
                    }
                    Expr::Op {
                        op: OpKind::Dot,
                        operand0: Some(a),
                        operand1: Some(b),
                        ..
                    } => {
                        let name1 = a.as_name()?;
                        let name2 = b.as_name()?;
                        self.modules[pos].find_literal(&format!("{name1}.{name2}"), true)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
