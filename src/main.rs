use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pdfrag::{
    app::{
        ContextAssembler, DEFAULT_CONTEXT_BUDGET_CHARS, DEFAULT_TOP_K, IndexDocumentUseCase,
        IndexLocation, IndexOutcome, QuestionAnsweringService, Retriever,
    },
    domain::{AdapterError, PipelineError},
    infra::{
        embedding::{EmbeddingProvider, OpenAiCompatibleEmbeddings},
        llm::{EnvCredential, OpenRouterAdapter, config_from_env, openrouter::ENV_API_KEY},
        logging::{LogFormat, LoggingConfig, init_logging},
        text::{ChunkSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
        vector_store::{DEFAULT_COLLECTION, DEFAULT_PERSIST_DIR, JsonVectorStore},
    },
};
use tracing::info;

const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "Você é um assistente especialista em analisar documentos em PDF.";
const SHELL_MAX_TOKENS: &str = "300";
const CHAT_PROMPT: &str = "pergunta> ";

/// Ask questions about a PDF using retrieval plus a remote chat model.
#[derive(Parser)]
#[command(name = "pdfrag")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the persisted vector index
    #[arg(long, global = true, default_value = DEFAULT_PERSIST_DIR)]
    index_dir: PathBuf,

    /// Collection name inside the index directory
    #[arg(long, global = true, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Build the vector index for a document, or confirm the persisted one
    Index {
        file: PathBuf,

        /// Discard the persisted collection first
        #[arg(long)]
        rebuild: bool,

        #[command(flatten)]
        chunking: ChunkingArgs,
    },

    /// Answer one question and exit
    Ask {
        question: String,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Read questions from stdin until EOF
    Chat {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(clap::Args)]
struct ChunkingArgs {
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,
}

#[derive(clap::Args)]
struct SessionArgs {
    /// Document to index when no persisted index exists
    #[arg(long)]
    file: Option<PathBuf>,

    /// Number of chunks retrieved per question
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Characters of retrieved context sent with each question
    #[arg(long, default_value_t = DEFAULT_CONTEXT_BUDGET_CHARS)]
    context_chars: usize,

    #[arg(long, env = "OPENROUTER_MAX_TOKENS", default_value = SHELL_MAX_TOKENS)]
    max_tokens: u32,

    /// Send only the user message, without the default system instruction
    #[arg(long)]
    no_system_prompt: bool,

    #[command(flatten)]
    chunking: ChunkingArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&LoggingConfig {
        level: cli.log_level.clone(),
        format: cli.log_format,
    });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", describe_error(&error));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let location = IndexLocation {
        persist_dir: cli.index_dir,
        collection: cli.collection,
    };
    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(
        OpenAiCompatibleEmbeddings::from_env().context("embedding provider configuration")?,
    );

    match cli.command {
        Command::Index {
            file,
            rebuild,
            chunking,
        } => {
            let use_case = index_use_case(&embeddings, &chunking, location)?;
            if rebuild {
                discard_collection(use_case.location())?;
            }
            let (_, outcome) = use_case.execute(Some(&file))?;
            match outcome {
                IndexOutcome::Reused { chunks } => {
                    println!("Reusing persisted index ({chunks} chunks). Pass --rebuild to re-index.");
                }
                IndexOutcome::Built { pages, chunks } => {
                    println!("Indexed {pages} pages into {chunks} chunks.");
                }
            }
            Ok(())
        }
        Command::Ask { question, session } => {
            let service = question_service(&embeddings, &session, location)?;
            let answer = service.answer(&question)?;
            println!("{}", answer.text);
            Ok(())
        }
        Command::Chat { session } => {
            let service = question_service(&embeddings, &session, location)?;
            chat_loop(&service)
        }
    }
}

fn index_use_case(
    embeddings: &Arc<dyn EmbeddingProvider>,
    chunking: &ChunkingArgs,
    location: IndexLocation,
) -> anyhow::Result<IndexDocumentUseCase> {
    let splitter = ChunkSplitter::new(chunking.chunk_size, chunking.chunk_overlap)?;
    Ok(IndexDocumentUseCase::new(
        Arc::clone(embeddings),
        splitter,
        location,
    ))
}

fn question_service(
    embeddings: &Arc<dyn EmbeddingProvider>,
    session: &SessionArgs,
    location: IndexLocation,
) -> anyhow::Result<QuestionAnsweringService> {
    let use_case = index_use_case(embeddings, &session.chunking, location)?;
    let (store, outcome) = use_case.execute(session.file.as_deref())?;
    info!(?outcome, "vector index ready");

    let env_config = config_from_env()?;
    let mut builder = env_config.to_builder().max_tokens(session.max_tokens);
    if session.no_system_prompt {
        builder = builder.clear_system_instruction();
    } else if env_config.system_instruction().is_none() {
        builder = builder.system_instruction(DEFAULT_SYSTEM_INSTRUCTION);
    }
    let adapter = OpenRouterAdapter::new(builder.build()?, EnvCredential::new(ENV_API_KEY))?;

    let retriever = Retriever::new(Arc::clone(embeddings), Box::new(store));
    info!(chunks = retriever.indexed_chunks(), "retriever ready");
    Ok(QuestionAnsweringService::new(retriever, Arc::new(adapter))
        .with_top_k(session.top_k)
        .with_assembler(ContextAssembler::new(session.context_chars)))
}

fn chat_loop(service: &QuestionAnsweringService) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "{CHAT_PROMPT}")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        match service.answer(&line) {
            Ok(answer) => writeln!(stdout, "\n{}\n", answer.text)?,
            Err(error) => eprintln!("{}", error.user_message()),
        }
    }
}

fn discard_collection(location: &IndexLocation) -> anyhow::Result<()> {
    if JsonVectorStore::discard(&location.persist_dir, location.collection.as_str())? {
        info!(collection = %location.collection, "discarded persisted collection");
    }
    Ok(())
}

fn describe_error(error: &anyhow::Error) -> String {
    if let Some(error) = error.downcast_ref::<PipelineError>() {
        return error.user_message();
    }
    if let Some(error) = error.downcast_ref::<AdapterError>() {
        return error.user_message();
    }
    format!("{error:#}")
}
