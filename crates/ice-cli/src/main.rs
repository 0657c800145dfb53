use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use ice_core::{
    CommitOutcome, Comparator, ConditionKind, ConditionRecord, Document, DumpFormat, EditSession, ItemPath, SessionError,
    discover_paths, files,
};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "ice",
    about = "Inspect and edit condition/action DSL fields of item config files",
    version
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List item keys and how many DSL fields each has
    Items(FileArgs),
    /// List DSL-bearing paths of one item
    Paths(ItemArgs),
    /// Show the decoded conditions at a path
    Show(ShowArgs),
    /// Replace the conditions at a path with a JSON record list
    Commit(CommitArgs),
    /// Append a condition at a path
    Add(FieldEditArgs),
    /// Change fields of the condition at --index
    Edit(IndexedEditArgs),
    /// Delete the condition at --index
    Delete(DeleteArgs),
    /// Copy the structured conditions of a path to every compatible path of the item
    Sync(SyncArgs),
    /// Re-emit a document in canonical form
    Dump(DumpArgs),
    /// Walk a directory of item files and summarize every DSL field
    Scan(DirArgs),
    /// Zip a config directory next to itself
    Backup(DirArgs),
}

#[derive(ClapArgs, Debug)]
struct FileArgs {
    /// Item config file (.yml)
    file: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct DirArgs {
    /// Directory containing item config files
    dir: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct ItemArgs {
    /// Item config file (.yml)
    file: PathBuf,
    /// Item key (top-level mapping key)
    #[arg(long)]
    item: String,
}

#[derive(ClapArgs, Debug)]
struct TargetArgs {
    /// Item config file (.yml)
    file: PathBuf,
    /// Item key (top-level mapping key)
    #[arg(long)]
    item: String,
    /// Path inside the item, e.g. actions.all.0.condition or ["actions","all","0","actions"]
    #[arg(long)]
    path: ItemPath,
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Write the edited document here; otherwise prints to stdout
    #[arg(long, conflicts_with = "in_place")]
    out: Option<PathBuf>,
    /// Overwrite the input file (a timestamped .bak copy is made first)
    #[arg(long, default_value_t = false)]
    in_place: bool,
}

#[derive(ClapArgs, Debug)]
struct FieldArgs {
    /// money, level, meta, mythicmobs, neigeitems, unknown, raw
    #[arg(long)]
    kind: Option<ConditionKind>,
    /// Item display name (item kinds only)
    #[arg(long)]
    name: Option<String>,
    /// Meta key, item id, or raw text for raw records
    #[arg(long)]
    key: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    amount: Option<f64>,
    /// Match by display name as well as NBT id (item kinds only)
    #[arg(long)]
    use_name: Option<bool>,
}

#[derive(ClapArgs, Debug)]
struct ShowArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Print records as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct CommitArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// JSON array of records, e.g. [{"kind":"money","amount":50}]
    #[arg(long)]
    records: String,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct FieldEditArgs {
    #[command(flatten)]
    target: TargetArgs,
    #[command(flatten)]
    fields: FieldArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct IndexedEditArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Condition index as listed by `show`
    #[arg(long)]
    index: usize,
    #[command(flatten)]
    fields: FieldArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct DeleteArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Condition index as listed by `show`
    #[arg(long)]
    index: usize,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct SyncArgs {
    #[command(flatten)]
    target: TargetArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

#[derive(ClapArgs, Debug)]
struct DumpArgs {
    /// Item config file (.yml)
    file: PathBuf,
    #[arg(long, value_enum, default_value_t = Format::Yaml)]
    format: Format,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Items(a) => cmd_items(a),
        Cmd::Paths(a) => cmd_paths(a),
        Cmd::Show(a) => cmd_show(a),
        Cmd::Commit(a) => cmd_commit(a),
        Cmd::Add(a) => cmd_add(a),
        Cmd::Edit(a) => cmd_edit(a),
        Cmd::Delete(a) => cmd_delete(a),
        Cmd::Sync(a) => cmd_sync(a),
        Cmd::Dump(a) => cmd_dump(a),
        Cmd::Scan(a) => cmd_scan(a),
        Cmd::Backup(a) => cmd_backup(a),
    }
}

fn die(code: i32, msg: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", msg);
    std::process::exit(code);
}

fn load(path: &Path) -> Document {
    files::read_document(path).unwrap_or_else(|e| die(2, format!("{}: {}", path.display(), e)))
}

fn open_session(doc: &Document, target: &TargetArgs) -> EditSession {
    EditSession::open(doc, &target.item, target.path.clone()).unwrap_or_else(|e| die(3, e))
}

fn emit(doc: &Document, source: &Path, output: &OutputArgs) {
    if output.in_place {
        let bak = files::backup_file(source).unwrap_or_else(|e| die(5, format!("backup failed: {}", e)));
        info!("backup written to {}", bak.display());
        files::write_document(source, doc).unwrap_or_else(|e| die(5, format!("error writing: {}", e)));
    } else if let Some(out) = &output.out {
        files::write_document(out, doc).unwrap_or_else(|e| die(5, format!("error writing: {}", e)));
    } else {
        match doc.dump(DumpFormat::Yaml) {
            Ok(s) => print!("{}", s),
            Err(e) => die(5, e),
        }
    }
}

fn apply_fields(record: &mut ConditionRecord, fields: &FieldArgs) {
    if let Some(kind) = fields.kind {
        record.set_kind(kind);
    }
    if let Some(name) = &fields.name {
        record.set_name(name);
    }
    if let Some(key) = &fields.key {
        record.set_key(key);
    }
    if let Some(amount) = fields.amount {
        record.set_amount(amount);
    }
    if let Some(use_name) = fields.use_name {
        record.set_use_name(use_name);
    }
}

fn commit_session(session: &mut EditSession, doc: &mut Document) {
    match session.commit(doc) {
        Ok(CommitOutcome::Unchanged) => eprintln!("no changes"),
        Ok(outcome) => info!("{} at {}: {:?}", session.item_key(), session.path(), outcome),
        Err(e) => die(4, e),
    }
}

fn print_record(idx: usize, r: &ConditionRecord) {
    let cmp = match r.comparator {
        Comparator::Ge => String::new(),
        other => format!(" ({})", other.as_str()),
    };
    println!(
        "{}\t{}\t{}\t{}\tx{}{}\t{}",
        idx,
        r.kind(),
        r.name(),
        r.key(),
        ice_core::encode::format_amount(r.amount()),
        cmp,
        r.raw_text
    );
}

fn cmd_items(args: FileArgs) {
    let doc = load(&args.file);
    for key in doc.item_keys() {
        let n = doc.item(key).map(|v| discover_paths(v).len()).unwrap_or(0);
        println!("{}\t{}", key, n);
    }
}

fn cmd_paths(args: ItemArgs) {
    let doc = load(&args.file);
    let item = doc
        .item(&args.item)
        .unwrap_or_else(|| die(3, format!("unknown item '{}'", args.item)));
    let paths = discover_paths(item);
    if paths.is_empty() {
        eprintln!("no editable paths");
    }
    for p in paths {
        println!("{}\t{}", p.path, p.kind.label());
    }
}

fn cmd_show(args: ShowArgs) {
    let doc = load(&args.target.file);
    let session = open_session(&doc, &args.target);
    if args.json {
        match serde_json::to_string_pretty(session.records()) {
            Ok(s) => println!("{}", s),
            Err(e) => die(5, e),
        }
        return;
    }
    println!("# {} ({})", session.path(), session.kind().label());
    for (i, r) in session.records().iter().enumerate() {
        print_record(i, r);
    }
}

fn cmd_commit(args: CommitArgs) {
    let mut doc = load(&args.target.file);
    let records: Vec<ConditionRecord> =
        serde_json::from_str(&args.records).unwrap_or_else(|e| die(3, format!("invalid --records JSON: {}", e)));
    if let Err(e) = ice_core::commit_conditions(&mut doc, &args.target.item, &args.target.path, &records) {
        die(4, e);
    }
    emit(&doc, &args.target.file, &args.output);
}

fn cmd_add(args: FieldEditArgs) {
    let mut doc = load(&args.target.file);
    let mut session = open_session(&doc, &args.target);
    let idx = session.add_condition();
    match session.record_mut(idx) {
        Ok(record) => apply_fields(record, &args.fields),
        Err(e) => die(4, e),
    }
    commit_session(&mut session, &mut doc);
    emit(&doc, &args.target.file, &args.output);
}

fn cmd_edit(args: IndexedEditArgs) {
    let mut doc = load(&args.target.file);
    let mut session = open_session(&doc, &args.target);
    match session.record_mut(args.index) {
        Ok(record) => apply_fields(record, &args.fields),
        Err(e) => die(4, e),
    }
    commit_session(&mut session, &mut doc);
    emit(&doc, &args.target.file, &args.output);
}

fn cmd_delete(args: DeleteArgs) {
    let mut doc = load(&args.target.file);
    let mut session = open_session(&doc, &args.target);
    if let Err(e) = session.delete_condition(args.index) {
        die(4, e);
    }
    commit_session(&mut session, &mut doc);
    emit(&doc, &args.target.file, &args.output);
}

fn cmd_sync(args: SyncArgs) {
    let mut doc = load(&args.target.file);
    let session = open_session(&doc, &args.target);
    match session.sync(&mut doc) {
        Ok(report) => {
            eprintln!("updated {} path(s)", report.updated_count());
            for p in &report.skipped {
                eprintln!("skipped: {}", p);
            }
        }
        Err(e) => die(4, e),
    }
    emit(&doc, &args.target.file, &args.output);
}

fn cmd_dump(args: DumpArgs) {
    let doc = load(&args.file);
    let format = match args.format {
        Format::Yaml => DumpFormat::Yaml,
        Format::Json => DumpFormat::Json,
    };
    match doc.dump(format) {
        Ok(s) => print!("{}", s),
        Err(e) => die(5, e),
    }
}

fn cmd_scan(args: DirArgs) {
    if !args.dir.is_dir() {
        die(2, format!("not found: {}", args.dir.display()));
    }
    for file in files::find_item_files(&args.dir) {
        let doc = match files::read_document(&file) {
            Ok(d) => d,
            Err(e) => {
                println!("{}\t$error\t{}", file.display(), e);
                continue;
            }
        };
        for key in doc.item_keys() {
            let Some(item) = doc.item(key) else { continue };
            for p in discover_paths(item) {
                let summary = match ice_core::load_conditions(&doc, key, &p.path) {
                    Ok(records) => {
                        let parsed = records.iter().filter(|r| r.is_parsed()).count();
                        format!("parsed={} raw={}", parsed, records.len() - parsed)
                    }
                    Err(SessionError::UnsupportedValue { found, .. }) => format!("unsupported {}", found),
                    Err(e) => e.to_string(),
                };
                println!("{}\t{}\t{}\t{}\t{}", file.display(), key, p.path, p.kind.label(), summary);
            }
        }
    }
}

fn cmd_backup(args: DirArgs) {
    match files::zip_backup_dir(&args.dir) {
        Ok(p) => println!("{}", p.display()),
        Err(e) => die(5, e),
    }
}
