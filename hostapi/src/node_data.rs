//! Opaque host-owned node state.
//!
//! The bridge never inspects node data. It holds a shared, read-only handle
//! and passes it through unchanged to host functions servicing a guest call.
//! The host keeps its own handle and therefore controls the lifetime; many
//! instances may share the same node data.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Shared read-only handle to host node data of type `N`.
pub struct NodeData<N: ?Sized> {
    inner: Arc<N>,
}

impl<N> NodeData<N> {
    pub fn new(data: N) -> Self {
        Self {
            inner: Arc::new(data),
        }
    }
}

impl<N: ?Sized> NodeData<N> {
    /// Borrow the node data.
    pub fn get(&self) -> &N {
        &self.inner
    }

    /// Another owning handle to the same node data.
    pub fn shared(&self) -> Arc<N> {
        Arc::clone(&self.inner)
    }

    /// Whether two handles refer to the same node data.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<N: ?Sized> Clone for NodeData<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N: ?Sized> From<Arc<N>> for NodeData<N> {
    fn from(inner: Arc<N>) -> Self {
        Self { inner }
    }
}

impl<N: ?Sized> Deref for NodeData<N> {
    type Target = N;

    fn deref(&self) -> &N {
        &self.inner
    }
}

impl<N: ?Sized> fmt::Debug for NodeData<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Opaque to the bridge.
        f.debug_struct("NodeData")
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_data_through() {
        let node = NodeData::new(vec![1u8, 2, 3]);
        assert_eq!(node.get(), &vec![1, 2, 3]);
        assert_eq!(node.len(), 3);
    }

    #[test]
    fn test_host_keeps_ownership() {
        let host: Arc<String> = Arc::new("node-state".into());
        let a = NodeData::from(Arc::clone(&host));
        let b = a.clone();

        assert!(a.ptr_eq(&b));
        assert_eq!(Arc::strong_count(&host), 3);
        drop(a);
        drop(b);
        assert_eq!(Arc::strong_count(&host), 1);
    }

    #[test]
    fn test_unsized_node_data() {
        let host: Arc<dyn Fn() -> u32 + Send + Sync> = Arc::new(|| 42);
        let node = NodeData::from(host);
        assert_eq!((node.get())(), 42);
    }
}
