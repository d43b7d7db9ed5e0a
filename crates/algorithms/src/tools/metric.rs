//! Metric catalogue

use std::fmt;
use std::str::FromStr;

use geodiv_core::Error;

/// Kind of landscape input a metric consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandscapeKind {
    Polygons,
    Lines,
    Points,
    Raster,
}

impl fmt::Display for LandscapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LandscapeKind::Polygons => "polygon layer",
            LandscapeKind::Lines => "line layer",
            LandscapeKind::Points => "point layer",
            LandscapeKind::Raster => "raster",
        };
        f.write_str(s)
    }
}

/// Geodiversity index computed per grid zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Distinct polygon categories intersecting the zone (ANc)
    PolygonCategoryCount,
    /// Single-part polygon fragments in the zone (ANe)
    PolygonElementCount,
    /// Area-weighted Shannon diversity of polygon categories (SHDI)
    ShannonDiversity,
    /// Total line length inside the zone (Tl)
    TotalLength,
    /// Distinct point categories by nearest zone (PNc)
    PointCategoryCount,
    /// Points intersecting the zone (PNe)
    PointElementCount,
    /// Count-weighted entropy of point categories (H)
    UnitEntropy,
    /// Population standard deviation of raster cells (RSD)
    RasterStdDev,
    /// Circular standard deviation of angular raster cells (RSDc)
    CircularStdDev,
    /// Steinhaus vertical relief (RM)
    VerticalRelief,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::PolygonCategoryCount,
        Metric::PolygonElementCount,
        Metric::ShannonDiversity,
        Metric::TotalLength,
        Metric::PointCategoryCount,
        Metric::PointElementCount,
        Metric::UnitEntropy,
        Metric::RasterStdDev,
        Metric::CircularStdDev,
        Metric::VerticalRelief,
    ];

    /// Short code used in output column names
    pub fn code(self) -> &'static str {
        match self {
            Metric::PolygonCategoryCount => "ANc",
            Metric::PolygonElementCount => "ANe",
            Metric::ShannonDiversity => "SHDI",
            Metric::TotalLength => "Tl",
            Metric::PointCategoryCount => "PNc",
            Metric::PointElementCount => "PNe",
            Metric::UnitEntropy => "H",
            Metric::RasterStdDev => "RSD",
            Metric::CircularStdDev => "RSDc",
            Metric::VerticalRelief => "RM",
        }
    }

    pub fn landscape_kind(self) -> LandscapeKind {
        match self {
            Metric::PolygonCategoryCount | Metric::PolygonElementCount | Metric::ShannonDiversity => {
                LandscapeKind::Polygons
            }
            Metric::TotalLength => LandscapeKind::Lines,
            Metric::PointCategoryCount | Metric::PointElementCount | Metric::UnitEntropy => {
                LandscapeKind::Points
            }
            Metric::RasterStdDev | Metric::CircularStdDev | Metric::VerticalRelief => LandscapeKind::Raster,
        }
    }

    /// Whether a category field must be given
    pub fn requires_category(self) -> bool {
        matches!(
            self,
            Metric::PolygonCategoryCount
                | Metric::ShannonDiversity
                | Metric::PointCategoryCount
                | Metric::UnitEntropy
        )
    }

    /// Whether the output prefix comes from the category field rather than
    /// the landscape name
    pub(crate) fn prefix_from_category(self) -> bool {
        matches!(
            self,
            Metric::PolygonCategoryCount | Metric::PolygonElementCount | Metric::ShannonDiversity
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Configuration(format!("unknown metric '{}'", s)))
    }
}
