//! Common test utilities: reusable node types and graph builders.
use kairo::prelude::*;

/// Forwards its input plus an offset taken from its settings.
///
/// Pattern: input `value` (float) -> output `result` (float).
pub struct PassLogic;

impl NodeLogic for PassLogic {
    fn define_attrs(&self, node: &mut Node) -> std::result::Result<(), GraphError> {
        node.add_input(&AttrPath::root(), AttrSpec::new("value", DataType::Float))?;
        node.add_output(&AttrPath::root(), AttrSpec::new("result", DataType::Float))?;
        Ok(())
    }

    fn define_settings(&self, node: &mut Node) {
        node.settings_mut().set("offset", Value::Float(1.0));
    }

    fn run_stage(&mut self, _stage: &str, node: &mut Node) -> std::result::Result<(), StageError> {
        let offset = node
            .settings()
            .value("offset")
            .and_then(|v| v.as_float())
            .unwrap_or(1.0);
        let v = node
            .input_value("value")
            .and_then(|v| v.as_float())
            .unwrap_or(0.0);
        node.set_output_value("result", Value::Float(v + offset));
        Ok(())
    }
}

/// Sums its two inputs: `lhs` + `rhs` -> `result`.
pub struct MergeLogic;

impl NodeLogic for MergeLogic {
    fn define_attrs(&self, node: &mut Node) -> std::result::Result<(), GraphError> {
        node.add_input(&AttrPath::root(), AttrSpec::new("lhs", DataType::Float))?;
        node.add_input(&AttrPath::root(), AttrSpec::new("rhs", DataType::Float))?;
        node.add_output(&AttrPath::root(), AttrSpec::new("result", DataType::Float))?;
        Ok(())
    }

    fn run_stage(&mut self, _stage: &str, node: &mut Node) -> std::result::Result<(), StageError> {
        let lhs = node.input_value("lhs").and_then(|v| v.as_float()).unwrap_or(0.0);
        let rhs = node.input_value("rhs").and_then(|v| v.as_float()).unwrap_or(0.0);
        node.set_output_value("result", Value::Float(lhs + rhs));
        Ok(())
    }
}

/// Always fails its main stage.
pub struct FailingLogic;

impl NodeLogic for FailingLogic {
    fn define_attrs(&self, node: &mut Node) -> std::result::Result<(), GraphError> {
        node.add_input(&AttrPath::root(), AttrSpec::new("value", DataType::Float))?;
        node.add_output(&AttrPath::root(), AttrSpec::new("result", DataType::Float))?;
        Ok(())
    }

    fn run_stage(&mut self, stage: &str, node: &mut Node) -> std::result::Result<(), StageError> {
        Err(StageError::Failed {
            node: node.name().to_string(),
            stage: stage.to_string(),
            message: "forced failure".to_string(),
        })
    }
}

/// Two stages that append their name to the `log` output, for
/// observing how far a run got.
pub struct StageRecorderLogic;

impl NodeLogic for StageRecorderLogic {
    fn stage_names(&self) -> Vec<&'static str> {
        vec!["prepare", "main"]
    }

    fn define_attrs(&self, node: &mut Node) -> std::result::Result<(), GraphError> {
        node.add_output(&AttrPath::root(), AttrSpec::new("log", DataType::String))?;
        Ok(())
    }

    fn run_stage(&mut self, stage: &str, node: &mut Node) -> std::result::Result<(), StageError> {
        let mut log = node
            .get_output("log")
            .and_then(|(_, a)| a.value().as_str().map(str::to_string))
            .unwrap_or_default();
        if !log.is_empty() {
            log.push(',');
        }
        log.push_str(stage);
        node.set_output_value("log", Value::String(log));
        Ok(())
    }
}

/// Routes engine logging into the test harness output. Safe to call
/// from every test; only the first call wins.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A catalogue holding every test node type.
#[allow(dead_code)]
pub fn test_catalogue() -> NodeCatalogue {
    let mut catalogue = NodeCatalogue::new();
    catalogue.register("pass", || Box::new(PassLogic));
    catalogue.register("merge", || Box::new(MergeLogic));
    catalogue.register("failing", || Box::new(FailingLogic));
    catalogue.register("stages", || Box::new(StageRecorderLogic));
    catalogue
}

/// Connects `from.result` to `to.value`.
#[allow(dead_code)]
pub fn link(graph: &mut Graph, from: NodeId, to: NodeId) -> EdgeId {
    graph
        .connect(AttrRef::output(from, "result"), AttrRef::input(to, "value"))
        .expect("test link should be legal")
}

/// Creates pass nodes with the given names and chains them in order.
#[allow(dead_code)]
pub fn pass_chain(graph: &mut Graph, catalogue: &NodeCatalogue, names: &[&str]) -> Vec<NodeId> {
    let nodes: Vec<NodeId> = names
        .iter()
        .map(|name| {
            graph
                .create_node(catalogue, "pass", *name)
                .expect("chain node")
        })
        .collect();
    for pair in nodes.windows(2) {
        link(graph, pair[0], pair[1]);
    }
    nodes
}

/// Builds the four-node diamond `a -> (b, c) -> d`.
#[allow(dead_code)]
pub fn diamond(graph: &mut Graph, catalogue: &NodeCatalogue) -> (NodeId, NodeId, NodeId, NodeId) {
    let a = graph.create_node(catalogue, "pass", "a").unwrap();
    let b = graph.create_node(catalogue, "pass", "b").unwrap();
    let c = graph.create_node(catalogue, "pass", "c").unwrap();
    let d = graph.create_node(catalogue, "merge", "d").unwrap();
    link(graph, a, b);
    graph
        .connect(AttrRef::output(a, "result"), AttrRef::input(c, "value"))
        .unwrap();
    graph
        .connect(AttrRef::output(b, "result"), AttrRef::input(d, "lhs"))
        .unwrap();
    graph
        .connect(AttrRef::output(c, "result"), AttrRef::input(d, "rhs"))
        .unwrap();
    (a, b, c, d)
}
