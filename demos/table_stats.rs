use clap::Parser;
use collision_tables::CostModel;
use collision_tables::GrowthPolicy;
use collision_tables::KeyGenerator;
use collision_tables::KeyTable;
use collision_tables::Strategy;
use collision_tables::Table;
use collision_tables::TableConfig;

#[derive(Parser, Debug)]
struct Args {
    /// Use separate chaining (the default).
    #[arg(short = 'c', long = "chaining", conflicts_with = "open_addressing")]
    chaining: bool,

    /// Use open addressing with quadratic probing.
    #[arg(short = 'o', long = "open-addressing")]
    open_addressing: bool,

    #[arg(long, default_value_t = 997)]
    capacity: usize,

    #[arg(short = 'l', long, default_value_t = 0.5)]
    load_factor: f64,

    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Lookups, removals and re-insertions to run after pre-filling.
    #[arg(short = 'n', long, default_value_t = 1000)]
    operations: usize,

    /// Carry probed keys across growth by index instead of re-probing.
    #[arg(long)]
    copy_by_index: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let strategy = if args.open_addressing && !args.chaining {
        Strategy::OpenAddressing
    } else {
        Strategy::Chaining
    };
    let growth = if args.copy_by_index {
        GrowthPolicy::CopyByIndex
    } else {
        GrowthPolicy::Rehash
    };

    let mut config = TableConfig::new(args.capacity)
        .load_factor(args.load_factor)
        .growth(growth);
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }

    println!(
        "Creating {} table with capacity {} at load factor {}",
        strategy, config.capacity, config.load_factor
    );
    let mut table: Table = Table::with_config(strategy, &config)?;
    println!("Pre-filled with {} keys", table.len());

    let mut keys = KeyGenerator::for_config(&config);
    let mut hits = 0usize;
    let mut misses = 0usize;
    for _ in 0..args.operations {
        if table.is_empty() {
            table.insert(keys.next_key())?;
        }
        let stored = table.random_key(keys.rng_mut())?.clone();
        match table.lookup(stored.as_str()) {
            Some(_) => hits += 1,
            None => misses += 1,
        }
        table.remove(stored.as_str());
        table.insert(keys.next_key())?;
    }

    println!(
        "Ran {} operations: {} lookups hit, {} missed",
        args.operations, hits, misses
    );
    println!(
        "Final capacity {} holding {} keys",
        table.capacity(),
        table.len()
    );

    match &table {
        Table::Chained(chained) => chained.chain_length_histogram().print(),
        Table::Probed(probed) => probed.probe_histogram().print(),
    }
    table.stats(&CostModel::REFERENCE).print();
    println!(
        "Native estimate: {} bytes",
        table.memory_estimate(&CostModel::native::<String>(table.strategy()))
    );

    Ok(())
}
