//! GLASS cluster redshifts, looked up from file names

/// (name, short lower-case name, redshift)
const CLUSTERS: [(&str, &str, f64); 10] = [
    ("A2744", "a2744", 0.308),
    ("A370", "a370", 0.375),
    ("MACS0416.1-2403", "macs0416", 0.396),
    ("MACS0717.5+3745", "macs0717", 0.548),
    ("MACS0744.9+3927", "macs0744", 0.686),
    ("MACS1149.6+2223", "macs1149", 0.544),
    ("MACS1423.8+2404", "macs1423", 0.545),
    ("MACS2129.4-0741", "macs2129", 0.570),
    ("RXJ2248", "rxj2248", 0.348),
    ("RXJ1347.5-1145", "rxj1347", 0.451),
];

/// Cluster named in `file_name` and its redshift; `("None", 0.0)` when unknown
pub fn cluster_redshift(file_name: &str) -> (&'static str, f64) {
    CLUSTERS
        .iter()
        .find(|(name, short, _)| file_name.contains(name) || file_name.contains(short))
        .map(|(name, _, z)| (*name, *z))
        .unwrap_or_else(|| {
            tracing::debug!("No cluster redshift for {}", file_name);
            ("None", 0.0)
        })
}
