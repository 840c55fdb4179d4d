//! Static filler data for VPMTS quota-fill.

use crate::types::MatchingType;

/// Candidates for categories whose name mentions one of `keywords`.
#[derive(Debug)]
pub struct VariationEntry {
    pub keywords: &'static [&'static str],
    /// The plain object the category denotes
    pub base: &'static str,
    pub candidates: &'static [&'static str],
}

/// Members of a class. Used for Class and Identical matching.
pub static MEMBER_TABLE: &[VariationEntry] = &[
    VariationEntry {
        keywords: &["mammal"],
        base: "Dog",
        candidates: &["Dog", "Cat", "Horse", "Cow", "Elephant", "Lion", "Bear", "Rabbit", "Monkey", "Whale"],
    },
    VariationEntry {
        keywords: &["reptile"],
        base: "Snake",
        candidates: &["Snake", "Lizard", "Turtle", "Crocodile", "Alligator", "Gecko", "Iguana", "Chameleon"],
    },
    VariationEntry {
        keywords: &["bird"],
        base: "Bird",
        candidates: &["Robin", "Eagle", "Parrot", "Owl", "Penguin", "Duck", "Sparrow", "Flamingo"],
    },
    VariationEntry {
        keywords: &["fish"],
        base: "Fish",
        candidates: &["Goldfish", "Salmon", "Shark", "Tuna", "Clownfish", "Trout"],
    },
    VariationEntry {
        keywords: &["insect", "bug"],
        base: "Bug",
        candidates: &["Ant", "Bee", "Butterfly", "Ladybug", "Grasshopper", "Dragonfly"],
    },
    VariationEntry {
        keywords: &["animal", "pet"],
        base: "Dog",
        candidates: &["Dog", "Cat", "Bird", "Fish", "Horse", "Cow", "Pig", "Sheep", "Duck", "Rabbit"],
    },
    VariationEntry {
        keywords: &["vehicle", "transportation"],
        base: "Car",
        candidates: &[
            "Car", "Truck", "Bus", "Train", "Airplane", "Boat", "Bicycle", "Motorcycle", "Helicopter", "Tractor",
        ],
    },
    VariationEntry {
        keywords: &["fruit"],
        base: "Apple",
        candidates: &["Apple", "Banana", "Orange", "Grapes", "Strawberry", "Pear", "Watermelon", "Pineapple"],
    },
    VariationEntry {
        keywords: &["vegetable", "veggie"],
        base: "Carrot",
        candidates: &["Carrot", "Broccoli", "Corn", "Potato", "Peas", "Tomato", "Lettuce", "Cucumber"],
    },
    VariationEntry {
        keywords: &["food", "snack"],
        base: "Apple",
        candidates: &["Apple", "Banana", "Bread", "Cheese", "Pizza", "Rice", "Egg", "Cookie", "Carrot", "Milk"],
    },
    VariationEntry {
        keywords: &["drink", "beverage"],
        base: "Milk",
        candidates: &["Milk", "Water", "Juice", "Lemonade", "Tea", "Hot chocolate"],
    },
    VariationEntry {
        keywords: &["clothing", "clothes"],
        base: "Shirt",
        candidates: &["Shirt", "Pants", "Sock", "Shoe", "Hat", "Jacket", "Dress", "Gloves"],
    },
    VariationEntry {
        keywords: &["furniture"],
        base: "Chair",
        candidates: &["Chair", "Table", "Bed", "Couch", "Dresser", "Bookshelf", "Desk", "Stool"],
    },
    VariationEntry {
        keywords: &["instrument"],
        base: "Drum",
        candidates: &["Drum", "Guitar", "Piano", "Violin", "Trumpet", "Flute", "Xylophone", "Harmonica"],
    },
    VariationEntry {
        keywords: &["tool"],
        base: "Hammer",
        candidates: &["Hammer", "Screwdriver", "Wrench", "Saw", "Pliers", "Shovel", "Drill", "Tape measure"],
    },
    VariationEntry {
        keywords: &["toy"],
        base: "Ball",
        candidates: &["Ball", "Doll", "Blocks", "Teddy bear", "Puzzle", "Toy car", "Kite", "Yo-yo"],
    },
    VariationEntry {
        keywords: &["shape"],
        base: "Circle",
        candidates: &["Circle", "Square", "Triangle", "Rectangle", "Star", "Heart", "Oval", "Diamond"],
    },
    VariationEntry {
        keywords: &["color", "colour"],
        base: "Red",
        candidates: &["Red", "Blue", "Green", "Yellow", "Orange", "Purple", "Pink", "Black"],
    },
];

/// Named variants of one object. Used for Non-Identical matching.
pub static VARIANT_TABLE: &[VariationEntry] = &[
    VariationEntry {
        keywords: &["dog", "puppy"],
        base: "Dog",
        candidates: &["Golden retriever", "Poodle", "Beagle", "Bulldog", "Dalmatian", "Labrador", "Chihuahua", "German shepherd"],
    },
    VariationEntry {
        keywords: &["car"],
        base: "Car",
        candidates: &["Red car", "Blue car", "Race car", "Police car", "Taxi", "Sports car", "Convertible", "Jeep"],
    },
    VariationEntry {
        keywords: &["apple"],
        base: "Apple",
        candidates: &["Red apple", "Green apple", "Yellow apple", "Apple slice", "Bitten apple", "Cartoon apple"],
    },
    VariationEntry {
        keywords: &["cat", "kitten"],
        base: "Cat",
        candidates: &["Tabby cat", "Black cat", "White cat", "Orange cat", "Siamese cat", "Kitten"],
    },
    VariationEntry {
        keywords: &["flower"],
        base: "Flower",
        candidates: &["Rose", "Daisy", "Tulip", "Sunflower", "Lily", "Daffodil"],
    },
    VariationEntry {
        keywords: &["shoe"],
        base: "Shoe",
        candidates: &["Sneaker", "Boot", "Sandal", "High heel", "Slipper", "Dress shoe"],
    },
    VariationEntry {
        keywords: &["ball"],
        base: "Ball",
        candidates: &["Soccer ball", "Basketball", "Tennis ball", "Baseball", "Beach ball", "Football"],
    },
    VariationEntry {
        keywords: &["bird"],
        base: "Bird",
        candidates: &["Robin", "Blue jay", "Cardinal", "Parrot", "Owl", "Pigeon"],
    },
    VariationEntry {
        keywords: &["truck"],
        base: "Truck",
        candidates: &["Fire truck", "Dump truck", "Pickup truck", "Garbage truck", "Tow truck", "Delivery truck"],
    },
    VariationEntry {
        keywords: &["cup", "mug"],
        base: "Cup",
        candidates: &["Coffee mug", "Tea cup", "Plastic cup", "Sippy cup", "Paper cup", "Glass"],
    },
    VariationEntry {
        keywords: &["tree"],
        base: "Tree",
        candidates: &["Oak tree", "Pine tree", "Palm tree", "Maple tree", "Apple tree", "Christmas tree"],
    },
    VariationEntry {
        keywords: &["hat"],
        base: "Hat",
        candidates: &["Baseball cap", "Cowboy hat", "Top hat", "Beanie", "Sun hat", "Party hat"],
    },
];

const NON_IDENTICAL_FALLBACK: &[&str] = &[
    "Dogs", "Cars", "Apples", "Cats", "Flowers", "Shoes", "Balls", "Birds", "Trucks", "Cups",
];

const CLASS_FALLBACK: &[&str] = &[
    "Mammals", "Reptiles", "Vehicles", "Fruits", "Vegetables", "Clothing", "Furniture", "Instruments", "Tools", "Toys",
];

const IDENTICAL_FALLBACK: &[&str] = &[
    "Animals", "Foods", "Vehicles", "Toys", "Clothing", "Furniture", "Instruments", "Shapes", "Colors", "Tools",
];

/// Category names to synthesize from when the model produced too few.
pub fn fallback_categories(matching: MatchingType) -> &'static [&'static str] {
    match matching {
        MatchingType::NonIdentical => NON_IDENTICAL_FALLBACK,
        MatchingType::Class => CLASS_FALLBACK,
        MatchingType::Identical => IDENTICAL_FALLBACK,
    }
}

/// First entry with a keyword that names a word of `category`.
///
/// `"Farm Animals"` matches `animal`; `"Boxes"` would match `box`.
pub fn lookup(table: &'static [VariationEntry], category: &str) -> Option<&'static VariationEntry> {
    let category = category.to_lowercase();
    let words: Vec<&str> = category
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    table.iter().find(|entry| {
        entry.keywords.iter().any(|kw| {
            words.iter().any(|word| {
                *word == *kw
                    || word.strip_suffix('s') == Some(*kw)
                    || word.strip_suffix("es") == Some(*kw)
            })
        })
    })
}
