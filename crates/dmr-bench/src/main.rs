//! Benchmark for DMR serialization using management-model data.
//!
//! Builds a synthetic resource tree (or converts a JSON document given as
//! the first argument) and times the binary, base64 and JSON encodings.

use std::fs;
use std::time::Instant;

use dmr::{ModelNode, ModelType};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const DECODE_ITERS: u32 = 10;

/// Number of synthetic server entries in the generated tree.
const SERVERS: usize = 2_000;

/// Converts a parsed JSON document into a model tree.
///
/// Integers that fit become ints or longs, other numbers become doubles.
fn json_to_node(value: &Value) -> ModelNode {
    match value {
        Value::Null => ModelNode::new(),
        Value::Bool(b) => ModelNode::from(*b),
        Value::Number(n) => match n.as_i64() {
            Some(v) => match i32::try_from(v) {
                Ok(v) => ModelNode::from(v),
                Err(_) => ModelNode::from(v),
            },
            None => ModelNode::from(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) if s.starts_with("${") => ModelNode::expression(s.as_str()),
        Value::String(s) => ModelNode::from(s.as_str()),
        Value::Array(items) => ModelNode::from(items.iter().map(json_to_node).collect::<Vec<_>>()),
        Value::Object(map) => {
            let mut node = ModelNode::empty_object();
            for (key, child) in map {
                node.get_or_create(key.as_str())
                    .and_then(|slot| slot.set(json_to_node(child)))
                    .expect("Failed to build object");
            }
            node
        }
    }
}

/// Builds a read-resource style response describing many server instances.
fn synthetic_tree() -> ModelNode {
    let mut root = ModelNode::new();
    root.get_or_create("outcome").and_then(|n| n.set("success")).expect("Failed to set outcome");
    let result = root.get_or_create("result").expect("Failed to create result");

    for i in 0..SERVERS {
        let name = format!("server-{i}");
        let server = result
            .get_or_create_path(&["server", name.as_str()])
            .expect("Failed to create server");
        server.get_or_create("name").and_then(|n| n.set(name.as_str())).expect("name");
        server.get_or_create("port").and_then(|n| n.set(8080 + i as i32)).expect("port");
        server
            .get_or_create("started-at")
            .and_then(|n| n.set(1_700_000_000_000i64 + i as i64))
            .expect("started-at");
        server
            .get_or_create("load")
            .and_then(|n| n.set(i as f64 / SERVERS as f64))
            .expect("load");
        server.get_or_create("enabled").and_then(|n| n.set(i % 3 != 0)).expect("enabled");
        server
            .get_or_create("bind")
            .and_then(|n| n.set_expression("${jboss.bind.address:127.0.0.1}"))
            .expect("bind");
        server.get_or_create("kind").and_then(|n| n.set(ModelType::Object)).expect("kind");
        let address = server.get_or_create("address").expect("address");
        address.add_property("host", "primary").expect("host");
        address.add_property("server", name.as_str()).expect("server");
    }
    root
}

fn throughput(len: usize, secs: f64) -> f64 {
    (len as f64 / 1_000_000.0) / secs
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let build_start = Instant::now();
    let node = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading model from: {}", path);
            let json = fs::read_to_string(&path).expect("Failed to read JSON file");
            let value: Value = serde_json::from_str(&json).expect("Failed to parse JSON");
            json_to_node(&value)
        }
        None => synthetic_tree(),
    };
    let build_time = build_start.elapsed();
    tracing::info!(model_type = %node.get_type(), ?build_time, "model tree ready");
    println!("Built {} tree in {:?}", node.get_type(), build_time);

    // Binary encoding
    let encode_start = Instant::now();
    let encoded = node.to_bytes().expect("Failed to encode");
    let encode_time = encode_start.elapsed();
    println!("\nBinary: {} bytes in {:?}", encoded.len(), encode_time);
    println!(
        "  Throughput: {:.2} MB/s",
        throughput(encoded.len(), encode_time.as_secs_f64())
    );

    // Binary decoding
    for _ in 0..3 {
        let _ = ModelNode::from_bytes(&encoded).expect("Failed to decode");
    }
    let decode_start = Instant::now();
    let mut decoded = None;
    for _ in 0..DECODE_ITERS {
        decoded = Some(ModelNode::from_bytes(&encoded).expect("Failed to decode"));
    }
    let decode_time = decode_start.elapsed() / DECODE_ITERS;
    println!(
        "\nDecode: {:?} (avg of {} iterations)",
        decode_time, DECODE_ITERS
    );
    println!(
        "  Throughput: {:.2} MB/s",
        throughput(encoded.len(), decode_time.as_secs_f64())
    );
    assert_eq!(decoded.as_ref(), Some(&node), "Decoded tree should equal the original");

    // Base64 envelope
    let base64_start = Instant::now();
    let base64 = node.to_base64().expect("Failed to encode base64");
    let base64_time = base64_start.elapsed();
    println!("\nBase64: {} chars in {:?}", base64.len(), base64_time);
    let roundtrip = ModelNode::from_base64(&base64).expect("Failed to decode base64");
    assert_eq!(roundtrip, node, "Base64 round trip should equal the original");

    // JSON export
    for compact in [true, false] {
        let json_start = Instant::now();
        let json = node.to_json_string(compact);
        let json_time = json_start.elapsed();
        println!(
            "\nJSON ({}): {} bytes in {:?}",
            if compact { "compact" } else { "pretty" },
            json.len(),
            json_time
        );
        println!(
            "  Size vs binary: {:.2}x",
            json.len() as f64 / encoded.len() as f64
        );
        serde_json::from_str::<Value>(&json).expect("JSON export should parse");
    }

    // DMR text
    let text_start = Instant::now();
    let text = node.to_dmr_string(false);
    println!("\nDMR text: {} bytes in {:?}", text.len(), text_start.elapsed());
}
