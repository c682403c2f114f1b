use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn init(quiet: bool, verbose: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
    VERBOSE.store(verbose, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn print_info(message: &str) {
    if !is_quiet() {
        println!("{} {}", "ℹ".blue(), message);
    }
}

pub fn print_success(message: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green().bold(), message.green());
    }
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_header(message: &str) {
    if !is_quiet() {
        println!("\n{}", message.bold().cyan());
        println!("{}", "─".repeat(message.chars().count()).cyan());
    }
}

pub fn print_verbose(message: &str) {
    if is_verbose() && !is_quiet() {
        println!("  {}", message.dimmed());
    }
}

/// Resultado de um CNPJ no terminal. Sai mesmo em modo silencioso, pois é a resposta do comando.
pub fn print_cnpj_line(cnpj: &str, formatted: &str, details: &str, valid: bool) {
    let status = if valid {
        "válido".green().bold()
    } else {
        "inválido".red().bold()
    };
    println!("{} {} {} {}", cnpj.bold(), formatted.dimmed(), details, status);
}

pub fn print_group(region: &str, members: &[String]) {
    println!("{} {} ({})", "Região".bold().cyan(), region.bold(), members.len());
    for member in members {
        println!("  {} {}", "•".cyan(), member);
    }
}

pub fn print_statistics(stats: &[(&str, u64)]) {
    if is_quiet() {
        return;
    }

    println!("\n{}", "Estatísticas:".bold().cyan());
    for (label, value) in stats {
        println!("  {}: {}", label.bold(), value.to_string().green());
    }
}

pub fn print_separator() {
    if !is_quiet() {
        println!("{}", "=".repeat(60).dimmed());
    }
}
