use approx::assert_abs_diff_eq;
use nanograd::graph::{GraphVisualizer, Op, check_grad};
use nanograd::nn::initializers::seeded_rng;
use nanograd::nn::{Mlp, Module};
use nanograd::{Engine, EngineError, MlpConfig};

#[test]
fn test_expression_through_public_api() {
    let engine = Engine::new();
    let a = engine.value(-4.0);
    let b = engine.value(2.0);

    let c = a + b;
    let d = a * b + b.powf(3.0);
    let c = c + c + 1.0;
    let c = c + 1.0 + c + (-a);
    let d = d + d * 2.0 + (b + a).relu();
    let d = d + 3.0 * d + (b - a).relu();
    let e = c - d;
    let f = e.powf(2.0);
    let g = f / 2.0;
    let g = g + 10.0 / f;
    g.backward();

    assert_abs_diff_eq!(g.data(), 24.70408163265306, epsilon = 1e-6);
    assert_abs_diff_eq!(a.grad(), 138.83381924198252, epsilon = 1e-6);
    assert_abs_diff_eq!(b.grad(), 645.5772594752186, epsilon = 1e-6);
}

#[test]
fn test_named_and_operator_forms_agree() {
    let engine = Engine::new();
    let a = engine.create_variable(1.5);
    let b = engine.create_variable(-0.25);
    let ab = engine.mul(a, b).unwrap();
    let named = engine.relu(engine.sub(ab, -1.0).unwrap()).unwrap();

    let other = Engine::new();
    let av = other.value(1.5);
    let bv = other.value(-0.25);
    let sugared = (av * bv - -1.0).relu();

    assert_eq!(engine.get_value(named), Some(sugared.data()));
    assert_eq!(engine.get_op(named), Some(Op::Relu));

    engine.backward(named).unwrap();
    sugared.backward();
    assert_eq!(engine.get_gradient(a), Some(av.grad()));
    assert_eq!(engine.get_gradient(b), Some(bv.grad()));
}

#[test]
fn test_mlp_gradients_match_finite_differences() {
    // Gradient of a small fixed network w.r.t. its inputs.
    let grads = check_grad(
        |engine, inputs| {
            let mut rng = seeded_rng(42);
            let mlp = Mlp::new(engine, &MlpConfig::new(3, vec![4], 1), &mut rng)?;
            let out = mlp.forward(engine, inputs)?;
            engine.pow(out[0], 2.0)
        },
        &[0.3, -0.2, 0.7],
        1e-6,
        1e-4,
    )
    .unwrap();
    assert_eq!(grads.len(), 3);
}

#[test]
fn test_power_by_node_is_rejected_everywhere() {
    let engine = Engine::new();
    let a = engine.value(3.0);
    let b = engine.value(2.0);
    assert!(matches!(a.pow(b), Err(EngineError::InvalidOperand(_))));
    assert!(matches!(
        engine.pow(2.0, a.id()),
        Err(EngineError::InvalidOperand(_))
    ));
}

#[test]
fn test_dot_export_writes_file() {
    let engine = Engine::new();
    let a = engine.value(1.0);
    let b = engine.value(-2.0);
    let y = (a * b + 0.5).relu();
    y.backward();

    let path = std::env::temp_dir().join(format!("nanograd_graph_{}.dot", std::process::id()));
    GraphVisualizer::new().save_dot(&engine, y.id(), &path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(content.contains("digraph G {"));
    for node in y.topological_order() {
        assert!(content.contains(&format!("node{} [shape=record", node.id().index())));
    }
    assert!(content.contains("label=\"+\""));
}
