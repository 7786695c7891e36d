use hg_sampler::{AxisData, GeneratorConfig, SampleGenerator};
use hg_types::{Domain, Sample, ValueType};

fn loss(sample: &Sample) -> f64 {
    let lr = sample["learning_rate"].as_f64().unwrap_or(1.0);
    let dropout = sample["dropout"].as_f64().unwrap_or(0.0);
    let layers = sample["layers"].as_f64().unwrap_or(1.0);
    (lr.log10() + 3.0).powi(2) + (dropout - 0.3).powi(2) + 0.01 * layers
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = GeneratorConfig::builder(512).jitter(0.2).seed(7).build()?;
    let mut sampler = SampleGenerator::with_config(config)?;

    sampler.set_axis(
        "learning_rate",
        AxisData::bounds(1e-5, 1e-1),
        Domain::LogUniform,
        ValueType::Float,
    )?;
    sampler.set_axis("dropout", AxisData::bounds(0.0, 0.6), Domain::Normal, ValueType::Float)?;
    sampler.set_axis("layers", AxisData::bounds(1.0, 8.0), Domain::Uniform, ValueType::Int)?;
    sampler.set_axis(
        "activation",
        AxisData::categories(["relu", "tanh", "gelu"]),
        Domain::Categorical,
        ValueType::Categorical,
    )?;

    println!(
        "{} samples ({} bins per continuous axis)",
        sampler.total_samples(),
        sampler.bins_per_axis()
    );

    let mut best: Option<(f64, Sample)> = None;
    while let Some(sample) = sampler.next_sample()? {
        let value = loss(&sample);
        if best.as_ref().map_or(true, |(b, _)| value < *b) {
            best = Some((value, sample));
        }
    }

    if let Some((value, sample)) = best {
        println!("best loss {value:.5}");
        let mut names: Vec<_> = sample.keys().collect();
        names.sort();
        for name in names {
            println!(" - {name}: {}", sample[name.as_str()]);
        }
    }
    Ok(())
}
