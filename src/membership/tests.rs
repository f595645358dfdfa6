//! Topology Module Tests
//!
//! ## Test Scopes
//! - **Parsing**: YAML shape, quoted and bare ports, field naming.
//! - **Validation**: Dense ids, duplicates, empty hosts, node count limits.
//! - **Lookup**: `address_of`, `peers_of` and out-of-range ids.

#[cfg(test)]
mod tests {
    use crate::error::SortError;
    use crate::membership::topology::{load, parse};
    use crate::membership::types::{NodeId, Topology, TopologyEntry};
    use std::io::Write;

    const FOUR_NODES: &str = r#"
servers:
  - serverId: 0
    host: 127.0.0.1
    port: "8080"
  - serverId: 1
    host: 127.0.0.1
    port: "8081"
  - serverId: 2
    host: 127.0.0.1
    port: 8082
  - serverId: 3
    host: localhost
    port: 8083
"#;

    fn entry(id: usize, port: u16) -> TopologyEntry {
        TopologyEntry {
            id: NodeId(id),
            host: "127.0.0.1".to_string(),
            port,
        }
    }

    // ============================================================
    // PARSING TESTS
    // ============================================================

    #[test]
    fn test_parse_quoted_and_bare_ports() {
        let topology = parse(FOUR_NODES).expect("valid topology");

        assert_eq!(topology.size(), 4);
        assert_eq!(topology.address_of(NodeId(0)).unwrap().port, 8080);
        assert_eq!(topology.address_of(NodeId(2)).unwrap().port, 8082);
        assert_eq!(topology.address_of(NodeId(3)).unwrap().host, "localhost");
        assert_eq!(
            topology.address_of(NodeId(1)).unwrap().address(),
            "127.0.0.1:8081"
        );
    }

    #[test]
    fn test_parse_orders_entries_by_id() {
        let yaml = r#"
servers:
  - serverId: 1
    host: b
    port: 2
  - serverId: 0
    host: a
    port: 1
"#;
        let topology = parse(yaml).unwrap();

        assert_eq!(topology.address_of(NodeId(0)).unwrap().host, "a");
        assert_eq!(topology.address_of(NodeId(1)).unwrap().host, "b");
    }

    #[test]
    fn test_parse_rejects_malformed_yaml() {
        let result = parse("servers: [ {serverId: 0, host: ");
        assert!(matches!(result, Err(SortError::Config(_))));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let yaml = "servers:\n  - serverId: 0\n    host: 127.0.0.1\n";
        assert!(matches!(parse(yaml), Err(SortError::Config(_))));
    }

    #[test]
    fn test_parse_rejects_bad_port() {
        let yaml = "servers:\n  - serverId: 0\n    host: h\n    port: \"http\"\n";
        assert!(matches!(parse(yaml), Err(SortError::Config(_))));

        let yaml = "servers:\n  - serverId: 0\n    host: h\n    port: 70000\n";
        assert!(matches!(parse(yaml), Err(SortError::Config(_))));
    }

    #[test]
    fn test_load_unreadable_file_is_config_error() {
        let result = load("/definitely/not/here/netsort.yaml");
        match result {
            Err(SortError::Config(msg)) => assert!(msg.contains("could not read config file")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FOUR_NODES.as_bytes()).unwrap();

        let topology = load(file.path()).unwrap();
        assert_eq!(topology.size(), 4);
    }

    // ============================================================
    // VALIDATION TESTS
    // ============================================================

    #[test]
    fn test_empty_topology_rejected() {
        assert!(matches!(
            Topology::new(vec![]),
            Err(SortError::Config(_))
        ));
        assert!(matches!(parse("servers: []"), Err(SortError::Config(_))));
    }

    #[test]
    fn test_gap_in_ids_rejected() {
        let result = Topology::new(vec![entry(0, 9000), entry(2, 9002)]);
        assert!(matches!(result, Err(SortError::Config(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Topology::new(vec![entry(0, 9000), entry(0, 9001)]);
        assert!(matches!(result, Err(SortError::Config(_))));
    }

    #[test]
    fn test_empty_host_rejected() {
        let mut bad = entry(0, 9000);
        bad.host = "  ".to_string();
        assert!(matches!(Topology::new(vec![bad]), Err(SortError::Config(_))));
    }

    #[test]
    fn test_too_many_nodes_rejected() {
        let mut yaml = String::from("servers:\n");
        for id in 0..257 {
            yaml.push_str(&format!(
                "  - serverId: {}\n    host: h\n    port: {}\n",
                id,
                10_000 + id
            ));
        }

        assert!(matches!(parse(&yaml), Err(SortError::Config(_))));
    }

    // ============================================================
    // LOOKUP TESTS
    // ============================================================

    #[test]
    fn test_address_of_out_of_range() {
        let topology = parse(FOUR_NODES).unwrap();

        assert!(topology.address_of(NodeId(3)).is_ok());
        assert!(matches!(
            topology.address_of(NodeId(4)),
            Err(SortError::Config(_))
        ));
    }

    #[test]
    fn test_peers_of_excludes_self() {
        let topology = parse(FOUR_NODES).unwrap();

        let peers: Vec<NodeId> = topology.peers_of(NodeId(2)).map(|e| e.id).collect();
        assert_eq!(peers, vec![NodeId(0), NodeId(1), NodeId(3)]);
    }

    #[test]
    fn test_single_node_has_no_peers() {
        let topology = Topology::new(vec![entry(0, 9000)]).unwrap();
        assert_eq!(topology.peers_of(NodeId(0)).count(), 0);
    }
}
