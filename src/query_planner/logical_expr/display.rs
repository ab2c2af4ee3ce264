use std::fmt;

use super::{Literal, LogicalExpr};

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for LogicalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalExpr::Constant(c) => write!(f, "{}", c.value),
            LogicalExpr::Parameter(p) => f.write_str(&p.name),
            LogicalExpr::MemberAccess(m) => write!(f, "{}.{}", m.target, m.member),
            LogicalExpr::MethodCall(call) => {
                if let Some(receiver) = &call.receiver {
                    write!(f, "{}.", receiver)?;
                }
                write!(f, "{}(", call.method.name)?;
                write_joined(f, &call.args)?;
                f.write_str(")")
            }
            LogicalExpr::Lambda(lambda) => {
                if lambda.params.len() == 1 {
                    write!(f, "{} => {}", lambda.params[0].name, lambda.body)
                } else {
                    let names: Vec<&str> = lambda.params.iter().map(|p| p.name.as_str()).collect();
                    write!(f, "({}) => {}", names.join(", "), lambda.body)
                }
            }
            LogicalExpr::Conditional(cond) => {
                write!(f, "({} ? {} : {})", cond.test, cond.if_true, cond.if_false)
            }
            LogicalExpr::Binary(bin) => write!(f, "({} {} {})", bin.left, bin.operator, bin.right),
            LogicalExpr::Not(operand) => write!(f, "!{}", operand),
            LogicalExpr::Convert(conv) => write!(f, "Convert({}, {})", conv.operand, conv.ty),
            LogicalExpr::TypeIs(test) => write!(f, "({} is {})", test.operand, test.ty),
            LogicalExpr::New(new) => {
                f.write_str("new { ")?;
                for (i, m) in new.members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", m.name, m.value)?;
                }
                f.write_str(" }")
            }
            LogicalExpr::EntityQuery(entity) => write!(f, "EntityQuery<{}>", entity),
        }
    }
}
