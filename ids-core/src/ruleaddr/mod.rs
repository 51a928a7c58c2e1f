//! Rule-address parser: bracketed/negated/variable address
//! expressions, a parallel port-expression grammar, and the bridge into
//! the address algebra's disjoint address groups.

mod parser;
mod port;

pub use parser::{build_address_group, group_is_complete, parse_address_expr, ParsedAtom, VarResolver};
pub use port::{parse_port_expr, PortRange};
