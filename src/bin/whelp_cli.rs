use serde::Serialize;
use std::{env, fs};
use whelp::{
    aggregate::{aggregate, DEFAULT_TOP_N},
    cross::cross,
    genotype::Genotype,
    import::genotype_from_text,
    phenotype::resolve,
    LOCI,
};

fn usage() {
    eprintln!(
        "Usage:\n  \
  whelp_cli --version\n  \
  whelp_cli loci\n  \
  whelp_cli resolve '<genotype>'\n  \
  whelp_cli cross '<sire>' '<dam>' [--top N]\n\n  \
  Genotypes are free text ('N/d co/co Koi') or @file.json"
    );
}

fn load_genotype_arg(value: &str) -> Result<Genotype, String> {
    if let Some(path) = value.strip_prefix('@') {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Could not read genotype file '{path}': {e}"))?;
        let genotype: Genotype = serde_json::from_str(&text)
            .map_err(|e| format!("Invalid genotype JSON '{path}': {e}"))?;
        genotype.validate().map_err(|e| e.to_string())?;
        Ok(genotype)
    } else {
        genotype_from_text(value).map_err(|e| e.to_string())
    }
}

fn parse_top_arg(args: &[String]) -> Result<usize, String> {
    match args.iter().position(|a| a == "--top") {
        Some(found) => {
            let value = args
                .get(found + 1)
                .ok_or_else(|| "Missing value for --top".to_string())?;
            value
                .parse()
                .map_err(|e| format!("Invalid --top value '{value}': {e}"))
        }
        None => Ok(DEFAULT_TOP_N),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        return Err("Missing command".to_string());
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!(
            "whelp {}\nCanine coat-genetics prediction engine",
            env!("CARGO_PKG_VERSION")
        );
        return Ok(());
    }

    let command = &args[1];
    match command.as_str() {
        "loci" => print_json(&LOCI.loci()),
        "resolve" => {
            if args.len() <= 2 {
                usage();
                return Err("Missing genotype".to_string());
            }
            let genotype = load_genotype_arg(&args[2])?;
            let descriptor = resolve(&genotype).map_err(|e| e.to_string())?;
            print_json(&descriptor)
        }
        "cross" => {
            if args.len() <= 3 {
                usage();
                return Err("cross requires: SIRE DAM".to_string());
            }
            let top_n = parse_top_arg(&args[4..])?;
            let sire = load_genotype_arg(&args[2])?;
            let dam = load_genotype_arg(&args[3])?;
            let entries = cross(&sire, &dam).map_err(|e| e.to_string())?;
            let results = aggregate(&entries, top_n).map_err(|e| e.to_string())?;
            print_json(&results)
        }
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
