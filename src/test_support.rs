use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::map::AugmentedTree;
use crate::node::NodeId;
use crate::stats::Aggregate;

pub(crate) fn init_test_logger() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("trace"))
        .expect("valid default filter");

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(env_filter)
        .try_init();
}

/// Renders the key layout as `key(left,right)`, with `-` for a missing child
/// and leaves written bare.
pub(crate) fn shape<A: Aggregate>(t: &AugmentedTree<A>) -> String {
    fn rec<A: Aggregate>(t: &AugmentedTree<A>, id: Option<NodeId>, out: &mut String) {
        let Some(id) = id else {
            out.push('-');
            return;
        };
        let node = &t.nodes[id];
        out.push_str(&node.key.to_string());
        if node.left.is_some() || node.right.is_some() {
            out.push('(');
            rec(t, node.left, out);
            out.push(',');
            rec(t, node.right, out);
            out.push(')');
        }
    }

    let mut out = String::new();
    if t.root.is_some() {
        rec(t, t.root, &mut out);
    }
    out
}
