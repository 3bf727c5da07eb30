//! Image and image collection expression builders.

use super::feature::{FeatureCollection, Geometry};
use super::filter::Filter;
use super::graph::{function_def, Expr};
use super::reducer::Reducer;

/// Remote image expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Image(Expr);

impl Image {
    /// Wraps an expression known to evaluate to an image.
    pub fn from_expr(expr: Expr) -> Self {
        Self(expr)
    }

    /// Loads a single image asset by id.
    pub fn load(id: &str) -> Self {
        Self(Expr::call("Image.load").arg("id", id).build())
    }

    /// A constant image with the given value in every pixel.
    pub fn constant(value: f64) -> Self {
        Self(Expr::call("Image.constant").arg("value", value).build())
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }

    /// Selects bands by name or regular expression.
    pub fn select(&self, bands: &[&str]) -> Image {
        self.invoke("Image.select", "input")
            .arg("bandSelectors", Expr::strings(bands.iter().copied()))
            .into()
    }

    /// Selects bands and renames them in one step.
    pub fn select_as(&self, bands: &[&str], names: &[&str]) -> Image {
        self.invoke("Image.select", "input")
            .arg("bandSelectors", Expr::strings(bands.iter().copied()))
            .arg("newNames", Expr::strings(names.iter().copied()))
            .into()
    }

    pub fn rename(&self, names: &[&str]) -> Image {
        self.invoke("Image.rename", "input")
            .arg("names", Expr::strings(names.iter().copied()))
            .into()
    }

    pub fn add(&self, value: f64) -> Image {
        self.binary("Image.add", &Image::constant(value))
    }

    pub fn subtract(&self, value: f64) -> Image {
        self.binary("Image.subtract", &Image::constant(value))
    }

    pub fn multiply(&self, value: f64) -> Image {
        self.binary("Image.multiply", &Image::constant(value))
    }

    pub fn divide(&self, value: f64) -> Image {
        self.binary("Image.divide", &Image::constant(value))
    }

    pub fn pow(&self, value: f64) -> Image {
        self.binary("Image.pow", &Image::constant(value))
    }

    /// Adds another image pixel-wise.
    pub fn add_image(&self, other: &Image) -> Image {
        self.binary("Image.add", other)
    }

    /// Multiplies by another image pixel-wise.
    pub fn multiply_image(&self, other: &Image) -> Image {
        self.binary("Image.multiply", other)
    }

    pub fn right_shift(&self, bits: u32) -> Image {
        self.binary("Image.rightShift", &Image::constant(f64::from(bits)))
    }

    pub fn bitwise_and(&self, mask: i64) -> Image {
        self.binary("Image.bitwiseAnd", &Image::constant(mask as f64))
    }

    pub fn eq(&self, value: f64) -> Image {
        self.binary("Image.eq", &Image::constant(value))
    }

    pub fn lte(&self, value: f64) -> Image {
        self.binary("Image.lte", &Image::constant(value))
    }

    pub fn gte(&self, value: f64) -> Image {
        self.binary("Image.gte", &Image::constant(value))
    }

    /// Logical AND of two mask images.
    pub fn and(&self, other: &Image) -> Image {
        self.binary("Image.and", other)
    }

    /// Marks pixels invalid where `mask` is zero.
    pub fn update_mask(&self, mask: &Image) -> Image {
        self.invoke("Image.updateMask", "image")
            .arg("mask", mask.expr().clone())
            .into()
    }

    /// Adds the bands of `source`, optionally replacing same-named bands.
    pub fn add_bands(&self, source: &Image, names: Option<&[&str]>, overwrite: bool) -> Image {
        self.invoke("Image.addBands", "dstImg")
            .arg("srcImg", source.expr().clone())
            .opt_arg("names", names.map(|n| Expr::strings(n.iter().copied())))
            .arg("overwrite", overwrite)
            .into()
    }

    /// `(first - second) / (first + second)` over two named bands.
    pub fn normalized_difference(&self, first: &str, second: &str) -> Image {
        self.invoke("Image.normalizedDifference", "input")
            .arg("bandNames", Expr::strings([first, second]))
            .into()
    }

    /// Sets a metadata property.
    pub fn set(&self, key: &str, value: impl Into<Expr>) -> Image {
        Image(element_set(&self.0, key, value.into()))
    }

    /// Reads a metadata property.
    pub fn get(&self, property: &str) -> Expr {
        element_get(&self.0, property)
    }

    /// The acquisition date of the image.
    pub fn date(&self) -> Expr {
        Expr::call("Image.date").arg("image", self.0.clone()).build()
    }

    /// Reduces pixels inside one geometry to a dictionary keyed by band name.
    pub fn reduce_region(&self, reducer: &Reducer, geometry: &Geometry, scale: f64) -> Expr {
        self.invoke("Image.reduceRegion", "image")
            .arg("reducer", reducer.expr().clone())
            .arg("geometry", geometry.expr().clone())
            .arg("scale", scale)
            .build()
    }

    /// Reduces pixels over every feature, adding the reducer output as properties.
    pub fn reduce_regions(
        &self,
        features: &FeatureCollection,
        reducer: &Reducer,
        scale: f64,
    ) -> FeatureCollection {
        FeatureCollection::from_expr(
            self.invoke("Image.reduceRegions", "image")
                .arg("collection", features.expr().clone())
                .arg("reducer", reducer.expr().clone())
                .arg("scale", scale)
                .build(),
        )
    }

    fn invoke(&self, function: &str, self_arg: &str) -> super::graph::Invocation {
        Expr::call(function).arg(self_arg, self.0.clone())
    }

    fn binary(&self, function: &str, other: &Image) -> Image {
        self.invoke(function, "image1")
            .arg("image2", other.expr().clone())
            .into()
    }
}

impl From<super::graph::Invocation> for Image {
    fn from(invocation: super::graph::Invocation) -> Self {
        Image(invocation.build())
    }
}

/// Remote image collection expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection(Expr);

impl ImageCollection {
    /// Loads an image collection by catalog id.
    pub fn load(id: &str) -> Self {
        Self(Expr::call("ImageCollection.load").arg("id", id).build())
    }

    pub fn from_expr(expr: Expr) -> Self {
        Self(expr)
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }

    pub fn filter(&self, filter: &Filter) -> ImageCollection {
        ImageCollection(collection_filter(&self.0, filter))
    }

    /// Keeps images whose `system:time_start` falls in `[start, end)`.
    pub fn filter_date(&self, start: &str, end: &str) -> ImageCollection {
        self.filter(&Filter::date_range(start, end))
    }

    /// Keeps images intersecting `geometry`.
    pub fn filter_bounds(&self, geometry: &Geometry) -> ImageCollection {
        self.filter(&Filter::bounds(geometry))
    }

    /// Applies `f` to every image.
    pub fn map(&self, f: impl FnOnce(Image) -> Image) -> ImageCollection {
        let def = function_def(|arg| f(Image(arg)).into_expr());
        ImageCollection(collection_map(&self.0, def))
    }

    /// Maps every image to a feature collection and flattens the results.
    pub fn flat_map_features(
        &self,
        f: impl FnOnce(Image) -> FeatureCollection,
    ) -> FeatureCollection {
        let def = function_def(|arg| f(Image(arg)).into_expr());
        let mapped = collection_map(&self.0, def);
        FeatureCollection::from_expr(
            Expr::call("Collection.flatten")
                .arg("collection", mapped)
                .build(),
        )
    }

    /// Concatenates two collections.
    pub fn merge(&self, other: &ImageCollection) -> ImageCollection {
        ImageCollection(
            Expr::call("Collection.merge")
                .arg("collection1", self.0.clone())
                .arg("collection2", other.expr().clone())
                .build(),
        )
    }

    /// Sorts by a property.
    pub fn sort(&self, property: &str, ascending: bool) -> ImageCollection {
        ImageCollection(
            Expr::call("Collection.limit")
                .arg("collection", self.0.clone())
                .arg("key", property)
                .arg("ascending", ascending)
                .build(),
        )
    }

    pub fn first(&self) -> Image {
        Image(
            Expr::call("Collection.first")
                .arg("collection", self.0.clone())
                .build(),
        )
    }

    /// Per-pixel median across the collection.
    pub fn median(&self) -> Image {
        Image(
            Expr::call("reduce.median")
                .arg("collection", self.0.clone())
                .build(),
        )
    }
}

pub(crate) fn collection_filter(collection: &Expr, filter: &Filter) -> Expr {
    Expr::call("Collection.filter")
        .arg("collection", collection.clone())
        .arg("filter", filter.expr().clone())
        .build()
}

pub(crate) fn collection_map(collection: &Expr, def: Expr) -> Expr {
    Expr::call("Collection.map")
        .arg("collection", collection.clone())
        .arg("baseAlgorithm", def)
        .build()
}

pub(crate) fn element_set(object: &Expr, key: &str, value: Expr) -> Expr {
    Expr::call("Element.set")
        .arg("object", object.clone())
        .arg("key", key)
        .arg("value", value)
        .build()
}

pub(crate) fn element_get(object: &Expr, property: &str) -> Expr {
    Expr::call("Element.get")
        .arg("object", object.clone())
        .arg("property", property)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_name(expr: &Expr) -> &str {
        match expr {
            Expr::Invocation { function, .. } => function,
            _ => panic!("Expected invocation, got {:?}", expr),
        }
    }

    fn arg<'a>(expr: &'a Expr, name: &str) -> &'a Expr {
        match expr {
            Expr::Invocation { args, .. } => args
                .get(name)
                .unwrap_or_else(|| panic!("missing argument {}", name)),
            _ => panic!("Expected invocation"),
        }
    }

    #[test]
    fn test_scale_chain_structure() {
        let img = Image::load("x").select(&["LST_Day_1km"]).multiply(0.02).subtract(273.15);
        assert_eq!(function_name(img.expr()), "Image.subtract");
        let inner = arg(img.expr(), "image1");
        assert_eq!(function_name(inner), "Image.multiply");
        assert_eq!(
            arg(arg(inner, "image2"), "value"),
            &Expr::constant(0.02)
        );
    }

    #[test]
    fn test_add_bands_overwrite() {
        let base = Image::load("x");
        let out = base.add_bands(&base.select(&["B1"]), Some(&["B1"]), true);
        assert_eq!(function_name(out.expr()), "Image.addBands");
        assert_eq!(arg(out.expr(), "overwrite"), &Expr::constant(true));
        assert_eq!(arg(out.expr(), "names"), &Expr::strings(["B1"]));
    }

    #[test]
    fn test_add_bands_without_names() {
        let base = Image::load("x");
        let out = base.add_bands(&base, None, true);
        if let Expr::Invocation { args, .. } = out.expr() {
            assert!(!args.contains_key("names"));
        }
    }

    #[test]
    fn test_collection_map_wraps_function_definition() {
        let col = ImageCollection::load("MODIS/061/MYD11A1").map(|img| img.multiply(2.0));
        assert_eq!(function_name(col.expr()), "Collection.map");
        match arg(col.expr(), "baseAlgorithm") {
            Expr::FunctionDef { params, body } => {
                assert_eq!(params.len(), 1);
                assert_eq!(
                    arg(body, "image1"),
                    &Expr::ArgumentRef(params[0].clone())
                );
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_flat_map_features_flattens() {
        let fc = FeatureCollection::load("projects/p/assets/a");
        let out = ImageCollection::load("c")
            .flat_map_features(|img| img.reduce_regions(&fc, &Reducer::mean(), 1000.0));
        assert_eq!(function_name(out.expr()), "Collection.flatten");
        assert_eq!(function_name(arg(out.expr(), "collection")), "Collection.map");
    }

    #[test]
    fn test_sort_then_first() {
        let img = ImageCollection::load("c").sort("dateDist", true).first();
        assert_eq!(function_name(img.expr()), "Collection.first");
        let sorted = arg(img.expr(), "collection");
        assert_eq!(function_name(sorted), "Collection.limit");
        assert_eq!(arg(sorted, "key"), &Expr::string("dateDist"));
    }
}
