use serde::Serialize;

// Homebuilders and building-products names offered by the stock picker.
const CONSTRUCTION_STOCKS: &[(&str, &str)] = &[
    ("IBP", "Installed Building Products, Inc."),
    ("SKY", "Skyline Champion Corporation"),
    ("KBH", "KB Home"),
    ("CVCO", "Cavco Industries, Inc."),
    ("GRBK", "Green Brick Partners, Inc."),
    ("TOL", "Toll Brothers, Inc."),
    ("DHI", "D.R. Horton, Inc."),
    ("LEN", "Lennar Corporation"),
    ("PHM", "PulteGroup, Inc."),
    ("NVR", "NVR, Inc."),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedStock {
    pub ticker: String,
    pub name: String,
}

pub fn tracked_stocks() -> Vec<TrackedStock> {
    CONSTRUCTION_STOCKS
        .iter()
        .map(|(ticker, name)| TrackedStock {
            ticker: ticker.to_string(),
            name: name.to_string(),
        })
        .collect()
}
