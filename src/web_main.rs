//! 凭据代理主程序入口

use page_translator::logging::init_logging;
use page_translator::web::{ProxyConfig, ProxyServer};

#[tokio::main]
async fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    let mut config = match ProxyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Set PAGE_TRANSLATOR_UPSTREAM_API_KEY before starting the proxy.");
            std::process::exit(1);
        }
    };

    // 简单的命令行参数解析，覆盖环境变量
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    config.bind_addr = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --bind requires an address");
                    std::process::exit(1);
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    config.port = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("Error: Invalid port number");
                        std::process::exit(1);
                    });
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            _ => {
                eprintln!("Error: Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = ProxyServer::new(config).start().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_help() {
    println!("Page Translator credential proxy");
    println!();
    println!("USAGE:");
    println!("    page-translator-proxy [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -b, --bind <ADDRESS>     Bind address [default: 127.0.0.1]");
    println!("    -p, --port <PORT>        Port number [default: 7080]");
    println!("    -h, --help               Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    PAGE_TRANSLATOR_UPSTREAM_API_KEY   Upstream bearer credential (required)");
    println!("    PAGE_TRANSLATOR_UPSTREAM_URL       Upstream chat-completions endpoint");
    println!("    PAGE_TRANSLATOR_UPSTREAM_MODEL     Model pinned for every request");
}
