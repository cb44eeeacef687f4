use log::{info, warn};
use nanograd::graph::EngineVisualization;
use nanograd::nn::initializers::seeded_rng;
use nanograd::nn::{Mlp, Module, Neuron, Sgd, mse_loss};
use nanograd::{Engine, MlpConfig, NodeId, TrainingConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Single neuron ===\n");
    single_neuron()?;

    println!("\n=== Tiny MLP regression ===\n");
    let training = TrainingConfig {
        learning_rate: 0.005,
        epochs: 200,
        print_every: 20,
        ..TrainingConfig::default()
    };
    train_mlp(&MlpConfig::new(2, vec![8], 1), &training)?;

    Ok(())
}

/// One ReLU neuron over two inputs, differentiated and rendered.
fn single_neuron() -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::new();
    let mut rng = seeded_rng(1337);
    let neuron = Neuron::new(&engine, 2, true, &mut rng)?;
    info!("built {}", neuron);

    let x = [engine.create_variable(1.0), engine.create_variable(-2.0)];
    let y = neuron.activate(&engine, &x)?;
    engine.backward(y)?;

    engine.plot_graph(y)?;

    match engine.save_graph_image(y, "gout") {
        Ok(path) => info!("graph rendered to {}", path),
        Err(e) => {
            warn!("could not render with Graphviz ({}), writing DOT only", e);
            engine.save_graph_dot(y, "gout.dot")?;
            info!("graph written to gout.dot");
        }
    }
    Ok(())
}

/// Fits `y = x0 - 2 * x1` on a small grid.
fn train_mlp(model_config: &MlpConfig, config: &TrainingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let samples: Vec<([f64; 2], f64)> = (-2..=2)
        .flat_map(|a| (-2..=2).map(move |b| (a as f64 * 0.5, b as f64 * 0.5)))
        .map(|(x0, x1)| ([x0, x1], x0 - 2.0 * x1))
        .collect();

    let mut engine = Engine::new();
    let mut rng = seeded_rng(config.seed);
    let model = Mlp::new(&engine, model_config, &mut rng)?;
    info!("{} with {} parameters", model, model.num_parameters());

    let optimizer = Sgd::new(config.learning_rate, model.parameters())?;
    let mark = engine.checkpoint();

    for epoch in 0..config.epochs {
        model.zero_grad(&engine)?;

        let mut predictions: Vec<NodeId> = Vec::with_capacity(samples.len());
        for (inputs, _) in &samples {
            predictions.extend(model.forward_values(&engine, inputs)?);
        }
        let targets: Vec<f64> = samples.iter().map(|(_, target)| *target).collect();
        let loss = mse_loss(&engine, &predictions, &targets)?;
        let loss_value = engine.get_value(loss).unwrap_or(f64::NAN);

        if !loss_value.is_finite() {
            return Err(format!("Training unstable at epoch {}: loss = {}", epoch + 1, loss_value).into());
        }

        engine.backward(loss)?;
        // Drop this epoch's graph; parameters and their gradients survive,
        // and only unconsumed leaves may be updated.
        engine.rewind(mark);
        optimizer.step(&engine)?;

        if epoch % config.print_every == 0 || epoch + 1 == config.epochs {
            println!("[EPOCH {}] Loss: {:.6}", epoch, loss_value);
        }
    }

    Ok(())
}
