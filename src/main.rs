//! Husk compiler CLI entry point.
//!
//! Usage:
//!   huskc compile <input.husk> [-o <output.ts>]
//!   huskc check <input.husk>    (resolve + type-check only)
//!   huskc parse <input.husk>    (dump AST)
//!   huskc lex <input.husk>      (dump tokens)

use husk_compiler::{errors::CompileError, lexer::Lexer, parser::Parser, token::TokenKind};
use miette::GraphicalReportHandler;
use std::{env, fs, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: huskc <command> <file.husk>");
        eprintln!("Commands: lex, parse, check, compile");
        process::exit(64);
    }

    let command = &args[1];
    let filename = &args[2];

    let source = match fs::read_to_string(filename) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {}", filename, e);
            process::exit(74);
        }
    };

    match command.as_str() {
        "lex" => {
            let mut lexer = Lexer::new(&source);
            loop {
                match lexer.next_token() {
                    Ok(token) => {
                        let done = token.kind == TokenKind::Eof;
                        println!("{:?}", token);
                        if done {
                            break;
                        }
                    }
                    Err(err) => report_and_exit(&source, err),
                }
            }
        }
        "parse" => {
            let program = parse(&source);
            println!("{:#?}", program);
        }
        "check" => {
            let mut program = parse(&source);
            if let Err(err) = husk_compiler::resolve::resolve(&mut program) {
                report_and_exit(&source, err);
            }
            if let Err(err) = husk_compiler::types::check(&mut program) {
                report_and_exit(&source, err);
            }
            println!("No errors.");
        }
        "compile" => {
            let compiled = match husk_compiler::try_compile(&source) {
                Ok(compiled) => compiled,
                Err(err) => report_and_exit(&source, err),
            };
            let output = if args.len() > 4 && args[3] == "-o" {
                args[4].clone()
            } else {
                filename.replace(".husk", ".ts")
            };
            match fs::write(&output, compiled) {
                Ok(()) => println!("Compiled to {}", output),
                Err(e) => {
                    eprintln!("Error writing output: {}", e);
                    process::exit(74);
                }
            }
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            process::exit(64);
        }
    }
}

/// Parse source code, exiting on errors.
fn parse(source: &str) -> husk_compiler::ast::Program {
    match Parser::new(Lexer::new(source)).parse() {
        Ok(program) => program,
        Err(err) => report_and_exit(source, err),
    }
}

/// Render the error with source context and exit with a data error code.
fn report_and_exit(source: &str, err: CompileError) -> ! {
    let report = err.into_report(source);
    let mut rendered = String::new();
    if GraphicalReportHandler::new()
        .render_report(&mut rendered, &report)
        .is_ok()
    {
        eprintln!("{}", rendered);
    } else {
        eprintln!("{}", report);
    }
    process::exit(65);
}
