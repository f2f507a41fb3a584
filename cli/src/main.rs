use clap::{Parser, Subcommand};
use lawmark_core::{Config, LawDocument, LawFile, MarkupRenderer, config_file_path};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

mod reader;
mod script;

#[derive(Parser, Debug)]
#[command(name = "lawmark")]
#[command(about = "Read a statute and highlight passages of its articles", long_about = None)]
struct Args {
    /// Configuration file (default: the platform config directory)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the law and its articles
    Show {
        /// Law JSON file
        file: PathBuf,
        /// Index of the law inside the file
        #[arg(long = "law")]
        law: Option<usize>,
        /// Print only this article (number or label)
        #[arg(short = 'a', long = "article")]
        article: Option<String>,
    },
    /// List the article numbers of a law
    Articles {
        /// Law JSON file
        file: PathBuf,
        /// Index of the law inside the file
        #[arg(long = "law")]
        law: Option<usize>,
    },
    /// Run a scripted annotation session
    Annotate {
        /// Law JSON file
        file: PathBuf,
        /// Index of the law inside the file
        #[arg(long = "law")]
        law: Option<usize>,
        /// Script to run (default: read from stdin)
        #[arg(short = 's', long = "script", value_name = "PATH")]
        script: Option<PathBuf>,
    },
    /// Show the configuration, or write it to the config file
    Config {
        /// Write the configuration file
        #[arg(long = "init")]
        init: bool,
        /// Overwrite an existing configuration file
        #[arg(long = "force", requires = "init")]
        force: bool,
    },
    /// Read and highlight a law interactively
    Read {
        /// Law JSON file
        file: PathBuf,
        /// Index of the law inside the file
        #[arg(long = "law")]
        law: Option<usize>,
    },
}

fn load_document(file: &Path, law: Option<usize>, config: &Config) -> Result<LawDocument, String> {
    let law_file = LawFile::from_path(file).map_err(|e| e.to_string())?;
    let law = law_file
        .law(law.unwrap_or(config.default_law))
        .map_err(|e| e.to_string())?;
    Ok(LawDocument::from_law(law))
}

fn cmd_show(
    document: &LawDocument,
    article: Option<String>,
    config: &Config,
) -> Result<(), String> {
    let renderer = MarkupRenderer::from_config(config);

    match article {
        Some(query) => {
            let (_, article) = document
                .find_article(&query)
                .ok_or_else(|| format!("No article '{}' in {}", query, document.name))?;
            print!("{}", renderer.article(&article.label, &article.container));
        }
        None => print!("{}", renderer.document(document)),
    }

    Ok(())
}

fn cmd_articles(document: &LawDocument) -> Result<(), String> {
    for article in document.articles() {
        println!(
            "{:<12} {} characters",
            article.label,
            article.container.char_len()
        );
    }

    Ok(())
}

fn cmd_annotate(
    document: LawDocument,
    script: Option<PathBuf>,
    config: &Config,
) -> Result<(), String> {
    let source = match script {
        Some(path) => fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read script '{}': {}", path.display(), e))?,
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .map_err(|e| format!("Failed to read script from stdin: {}", e))?;
            source
        }
    };

    let mut session = script::Session::new(document, config);
    let mut stdout = io::stdout();
    script::run_script(&mut session, &source, &mut stdout)?;
    log::info!(
        "annotated {} article(s) of {}",
        session.document().article_count(),
        session.document().name
    );
    Ok(())
}

fn cmd_read(document: LawDocument, config: &Config) -> Result<(), String> {
    if !reader::is_interactive_terminal() {
        return cmd_show(&document, None, config);
    }

    reader::run_reader(document, config).map_err(|e| format!("Failed to run reader: {}", e))
}

fn cmd_config(
    config: &Config,
    path: Option<&Path>,
    init: bool,
    force: bool,
) -> Result<(), String> {
    let path = path.ok_or_else(|| "No config directory found; pass --config".to_string())?;

    if init {
        if path.exists() && !force {
            return Err(format!(
                "Config file '{}' already exists (use --force to overwrite)",
                path.display()
            ));
        }
        config.save(path).map_err(|e| e.to_string())?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", config.to_toml().map_err(|e| e.to_string())?);
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let config_path = args.config.clone().or_else(config_file_path);
    let config = Config::load_or_default(config_path.as_deref());

    let result = match args.command {
        Commands::Show { file, law, article } => {
            load_document(&file, law, &config).and_then(|doc| cmd_show(&doc, article, &config))
        }
        Commands::Articles { file, law } => {
            load_document(&file, law, &config).and_then(|doc| cmd_articles(&doc))
        }
        Commands::Annotate { file, law, script } => load_document(&file, law, &config)
            .and_then(|doc| cmd_annotate(doc, script, &config)),
        Commands::Config { init, force } => {
            cmd_config(&config, config_path.as_deref(), init, force)
        }
        Commands::Read { file, law } => {
            load_document(&file, law, &config).and_then(|doc| cmd_read(doc, &config))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_init_refuses_to_overwrite() {
        let dir = std::env::temp_dir().join(format!("lawmark-cli-config-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("config.toml");
        let config = Config {
            coalesce_runs: true,
            ..Config::default()
        };

        cmd_config(&config, Some(&path), true, false).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);

        let err = cmd_config(&Config::default(), Some(&path), true, false).unwrap_err();
        assert!(err.contains("already exists"));
        assert_eq!(Config::load(&path).unwrap(), config);

        cmd_config(&Config::default(), Some(&path), true, true).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_config_without_path() {
        assert!(cmd_config(&Config::default(), None, false, false).is_err());
    }
}
