#[cfg(test)]
mod tests {
    use crate::Args;
    use clap::Parser;
    use list_clustering_core::PairPolicy;
    use std::path::PathBuf;

    #[test]
    fn test_args_default_values() {
        let args =
            Args::try_parse_from(["list-clustering", "--input", "lists.json"]).unwrap();

        assert_eq!(args.input, PathBuf::from("lists.json"));
        assert_eq!(args.output, None);
        assert_eq!(args.p, 0.9);
        assert_eq!(args.workers, None);
        assert_eq!(args.queue_capacity, None);
        assert_eq!(args.pair_policy, "unordered");
        assert_eq!(args.timeout_ms, None);
        assert!(!args.json_output);
        assert!(!args.disable_spans);
    }

    #[test]
    fn test_args_input_required() {
        assert!(Args::try_parse_from(["list-clustering"]).is_err());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "list-clustering",
            "--input",
            "lists.json",
            "--output",
            "edges.json",
            "--p",
            "0.5",
            "--workers",
            "3",
            "--queue-capacity",
            "7",
            "--timeout-ms",
            "1500",
            "--json-output",
        ])
        .unwrap();

        assert_eq!(args.output, Some(PathBuf::from("edges.json")));
        assert_eq!(args.p, 0.5);
        assert_eq!(args.workers, Some(3));
        assert_eq!(args.queue_capacity, Some(7));
        assert_eq!(args.timeout_ms, Some(1500));
        assert!(args.json_output);
    }

    #[test]
    fn test_args_parse_pair_policy() {
        let args = Args::try_parse_from([
            "list-clustering",
            "--input",
            "lists.json",
            "--pair-policy",
            "ordered",
        ])
        .unwrap();
        assert_eq!(args.parse_pair_policy().unwrap(), PairPolicy::Ordered);

        let args = Args::try_parse_from([
            "list-clustering",
            "--input",
            "lists.json",
            "--pair-policy",
            "invalid",
        ])
        .unwrap();
        assert!(args
            .parse_pair_policy()
            .unwrap_err()
            .to_string()
            .contains("Invalid pair policy"));
    }
}
