use clap::Parser;
use colored::Colorize;
use paramexpr::{Bindings, Number, Operand, ParameterExpression};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paramexpr")]
#[command(about = "Bind, differentiate and export parameter expressions")]
#[command(version)]
struct Args {
    /// Mathematical expression; every identifier becomes a parameter
    expression: String,

    /// Bind a parameter to a number, as `name=value` (repeatable)
    #[arg(short, long, value_parser = parse_binding)]
    bind: Vec<(String, Number)>,

    /// Differentiate with respect to this parameter before binding
    #[arg(short, long)]
    gradient: Option<String>,

    /// Print the replayed expression as SymPy source
    #[cfg(feature = "sympy")]
    #[arg(long)]
    sympy: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red(), e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut expr = ParameterExpression::parse(&args.expression)?;
    println!("    {}: {}", "Expression".cyan(), expr);
    println!("    {}: {{{}}}", "Parameters".cyan(), list_parameters(&expr));

    if let Some(name) = &args.gradient {
        let parameter = expr
            .parameter_by_name(name)
            .cloned()
            .ok_or_else(|| format!("no parameter named '{name}'"))?;
        expr = match expr.gradient(&parameter)? {
            Operand::Symbolic(derivative) => derivative,
            Operand::Constant(value) => ParameterExpression::constant(value),
        };
        println!("    {}: {}", format!("d/d{name}").cyan(), expr);
    }

    #[cfg(feature = "sympy")]
    {
        if args.sympy {
            let source = paramexpr::export(&expr, &paramexpr::backends::sympy::SympyExporter)?;
            println!("    {}: {}", "SymPy".cyan(), source);
        }
    }

    if !args.bind.is_empty() {
        let mut values = Bindings::new();
        for (name, value) in &args.bind {
            let parameter = expr
                .parameter_by_name(name)
                .cloned()
                .ok_or_else(|| format!("no parameter named '{name}'"))?;
            values.insert(parameter, Operand::Constant(*value));
        }
        expr = expr.bind(&values, false)?;
        println!("    {}: {}", "Bound".cyan(), expr);
    }

    if expr.is_bound() {
        println!("    {}: {}", "Value".green(), expr.numeric()?);
    }
    Ok(())
}

fn list_parameters(expr: &ParameterExpression) -> String {
    expr.parameters()
        .map(|p| p.name().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_binding(raw: &str) -> Result<(String, Number), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let value = match value.trim().parse::<i64>() {
        Ok(n) => Number::Int(n),
        Err(_) => value
            .trim()
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|e| format!("invalid value for '{name}': {e}"))?,
    };
    Ok((name.trim().to_string(), value))
}
