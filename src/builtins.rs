//! The built-in operator, function and constant table.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::{One, Zero};

use crate::decimal::{self, MathContext};
use crate::error::AnonResult;
use crate::registry::Registry;
use crate::types::OperatorAssociativity::{Left, Right};

const PI: &str = "3.1415926535897932384626433832795028841971693993751058209749445923078164062862089986280348253421170679";

pub fn install(registry: &mut Registry) {
    install_operators(registry);
    install_functions(registry);
    install_constants(registry);
}

fn install_operators(registry: &mut Registry) {
    registry.add_operator("+", 20, Left, |l, r, mc| Ok(mc.add(l, r)));
    registry.add_operator("-", 20, Left, |l, r, mc| Ok(mc.subtract(l, r)));
    registry.add_operator("*", 30, Left, |l, r, mc| Ok(mc.multiply(l, r)));
    registry.add_operator("/", 30, Left, |l, r, mc| mc.divide(l, r));
    registry.add_operator("%", 30, Left, |l, r, mc| mc.remainder(l, r));
    registry.add_operator("^", 40, Right, decimal::pow);

    registry.add_operator("&&", 4, Left, |l, r, _| {
        Ok(decimal::from_bool(decimal::truthy(l) && decimal::truthy(r)))
    });
    registry.add_operator("||", 2, Left, |l, r, _| {
        Ok(decimal::from_bool(decimal::truthy(l) || decimal::truthy(r)))
    });

    registry.add_operator(">", 10, Left, |l, r, _| Ok(decimal::from_bool(l > r)));
    registry.add_operator(">=", 10, Left, |l, r, _| Ok(decimal::from_bool(l >= r)));
    registry.add_operator("<", 10, Left, |l, r, _| Ok(decimal::from_bool(l < r)));
    registry.add_operator("<=", 10, Left, |l, r, _| Ok(decimal::from_bool(l <= r)));

    registry.add_operator("=", 7, Left, |l, r, _| Ok(decimal::from_bool(l == r)));
    registry.add_operator_alias("==", 7, Left, "=");
    registry.add_operator("!=", 7, Left, |l, r, _| Ok(decimal::from_bool(l != r)));
    registry.add_operator_alias("<>", 7, Left, "!=");
}

fn install_functions(registry: &mut Registry) {
    registry.add_function("not", 1, |args, _| Ok(decimal::from_bool(args[0].is_zero())));
    registry.add_function("if", 3, |args, _| {
        Ok(if decimal::truthy(&args[0]) { args[1].clone() } else { args[2].clone() })
    });

    registry.add_function("random", 0, |_, mc| decimal::from_f64(rand::random::<f64>(), mc));
    registry.add_function("randomBetween", 2, random_between);

    registry.add_function("sin", 1, |args, mc| degrees(args, mc, f64::sin));
    registry.add_function("cos", 1, |args, mc| degrees(args, mc, f64::cos));
    registry.add_function("tan", 1, |args, mc| degrees(args, mc, f64::tan));
    registry.add_function("sinh", 1, |args, mc| degrees(args, mc, f64::sinh));
    registry.add_function("cosh", 1, |args, mc| degrees(args, mc, f64::cosh));
    registry.add_function("tanh", 1, |args, mc| degrees(args, mc, f64::tanh));
    registry.add_function("rad", 1, |args, mc| float(args, mc, f64::to_radians));
    registry.add_function("deg", 1, |args, mc| float(args, mc, f64::to_degrees));

    registry.add_function("max", 2, |args, _| Ok(args[0].clone().max(args[1].clone())));
    registry.add_function("min", 2, |args, _| Ok(args[0].clone().min(args[1].clone())));
    registry.add_function("abs", 1, |args, mc| Ok(mc.round(&args[0].abs())));

    registry.add_function("log", 1, |args, mc| float(args, mc, f64::ln));
    registry.add_function("log10", 1, |args, mc| float(args, mc, f64::log10));

    registry.add_function("round", 1, |args, mc| Ok(args[0].with_scale_round(0, mc.rounding())));
    registry.add_function("floor", 1, |args, _| Ok(args[0].with_scale_round(0, RoundingMode::Floor)));
    registry.add_function("ceiling", 1, |args, _| Ok(args[0].with_scale_round(0, RoundingMode::Ceiling)));
    registry.add_function("sqrt", 1, |args, mc| decimal::sqrt(&args[0], mc));

    registry.add_function("evaluate", 1, |args, _| Ok(args[0].clone()));
}

fn install_constants(registry: &mut Registry) {
    if let Ok(pi) = BigDecimal::from_str(PI) {
        registry.add_constant("PI", pi);
    }
    registry.add_constant("TRUE", BigDecimal::one());
    registry.add_constant("FALSE", BigDecimal::zero());
}

/// Apply `f` in double precision to the single argument.
fn float(args: &[BigDecimal], context: &MathContext, f: fn(f64) -> f64) -> AnonResult<BigDecimal> {
    decimal::from_f64(f(decimal::to_f64(&args[0])?), context)
}

/// Like [`float`], with the argument given in degrees.
fn degrees(args: &[BigDecimal], context: &MathContext, f: fn(f64) -> f64) -> AnonResult<BigDecimal> {
    decimal::from_f64(f(decimal::to_f64(&args[0])?.to_radians()), context)
}

fn random_between(args: &[BigDecimal], context: &MathContext) -> AnonResult<BigDecimal> {
    let low = decimal::to_f64(&args[0])?;
    let high = decimal::to_f64(&args[1])?;
    decimal::from_f64(low + (high - low) * rand::random::<f64>(), context)
}
