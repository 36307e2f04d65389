use chain_hash::AddressModulo;
use chain_hash::FoldHashStrategy;
use chain_hash::HashStrategy;
use chain_hash::HashTable;
use clap::Parser;
use clap::ValueEnum;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    /// Key address modulo the bucket count.
    Modulo,
    /// Key address hashed with foldhash.
    Foldhash,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'b', long = "buckets", default_value_t = 1009)]
    buckets: usize,

    #[arg(short = 'k', long = "keys", default_value_t = 1000)]
    keys: usize,

    #[arg(short = 'p', long = "pop_every", default_value_t = 0)]
    pop_every: usize,

    #[arg(short = 's', long = "strategy", value_enum, default_value_t = Strategy::Foldhash)]
    strategy: Strategy,
}

fn run<H: HashStrategy<u64>>(args: &Args, strategy: H) -> Result<(), chain_hash::Error> {
    let keys = (0..args.keys as u64).map(Box::new).collect::<Vec<_>>();

    let mut table = HashTable::with_capacity(args.buckets, strategy)?;
    println!("Buckets: {}", table.size());
    println!("Filling table with {} keys...", keys.len());

    for key in &keys {
        table.set(&**key, **key)?;
    }

    let mut popped = 0;
    if args.pop_every > 0 {
        for key in keys.iter().step_by(args.pop_every) {
            if table.pop(&**key)?.is_some() {
                popped += 1;
            }
        }
        println!("Popped {popped} keys");
    }

    println!("Stored {} entries", table.len());
    println!(
        "Final load factor: {:.2}%",
        (table.len() as f64 / table.size() as f64) * 100.0
    );

    table.chain_histogram().print();
    table.debug_stats().print();
    Ok(())
}

fn main() {
    let args = Args::parse();

    println!("Using {:?} strategy", args.strategy);
    let result = match args.strategy {
        Strategy::Modulo => run(&args, AddressModulo),
        Strategy::Foldhash => run(&args, FoldHashStrategy::default()),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
