//! Ready-to-use [`Node`]s for the RDF vocabulary terms the reader and
//! writer reference directly (`a`, collections), mirroring the `vocab`
//! module of the RDF model crates in this family.

pub mod rdf {
    //! [RDF](https://www.w3.org/TR/rdf11-concepts/) vocabulary terms used
    //! while desugaring the `a` keyword and RDF collections.
    use crate::model::Node;

    pub fn type_() -> Node {
        Node::new_uri("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")
    }

    pub fn first() -> Node {
        Node::new_uri("http://www.w3.org/1999/02/22-rdf-syntax-ns#first")
    }

    pub fn rest() -> Node {
        Node::new_uri("http://www.w3.org/1999/02/22-rdf-syntax-ns#rest")
    }

    pub fn nil() -> Node {
        Node::new_uri("http://www.w3.org/1999/02/22-rdf-syntax-ns#nil")
    }
}

pub mod xsd {
    //! [XML Schema Datatypes](https://www.w3.org/TR/xmlschema11-2/) used to
    //! tag untyped numeric and boolean literals.
    use crate::model::Node;

    pub fn integer() -> Node {
        Node::new_uri("http://www.w3.org/2001/XMLSchema#integer")
    }

    pub fn decimal() -> Node {
        Node::new_uri("http://www.w3.org/2001/XMLSchema#decimal")
    }

    pub fn double() -> Node {
        Node::new_uri("http://www.w3.org/2001/XMLSchema#double")
    }

    pub fn boolean() -> Node {
        Node::new_uri("http://www.w3.org/2001/XMLSchema#boolean")
    }

    pub fn string() -> Node {
        Node::new_uri("http://www.w3.org/2001/XMLSchema#string")
    }
}
