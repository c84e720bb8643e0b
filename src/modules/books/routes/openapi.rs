//! OpenAPI fragment for the books routes; merged by the HTTP layer under `/api/books`.

use serde_json::{json, Value};

use crate::modules::books::models::BookCategory;

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{}", name) })
}

fn json_content(schema: Value) -> Value {
    json!({ "application/json": { "schema": schema } })
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": json_content(schema_ref("ErrorResponse"))
    })
}

fn path_param(name: &str, schema: Value) -> Value {
    json!({ "name": name, "in": "path", "required": true, "schema": schema })
}

fn query_param(name: &str, required: bool, schema: Value) -> Value {
    json!({ "name": name, "in": "query", "required": required, "schema": schema })
}

fn book_list_op(summary: &str, parameters: Vec<Value>) -> Value {
    json!({
        "summary": summary,
        "tags": ["Books"],
        "parameters": parameters,
        "responses": {
            "200": {
                "description": "Matching books",
                "content": json_content(json!({ "type": "array", "items": schema_ref("Book") }))
            },
            "400": error_response("Malformed parameters")
        }
    })
}

fn single_book_op(summary: &str, parameters: Vec<Value>) -> Value {
    json!({
        "summary": summary,
        "tags": ["Books"],
        "parameters": parameters,
        "responses": {
            "200": { "description": "The book", "content": json_content(schema_ref("Book")) },
            "404": error_response("Book not found")
        }
    })
}

fn string_schema() -> Value {
    json!({ "type": "string" })
}

fn number_schema() -> Value {
    json!({ "type": "number" })
}

fn id_param() -> Value {
    path_param("id", json!({ "type": "integer", "format": "int64" }))
}

pub fn document() -> Value {
    let request_body = json!({
        "required": true,
        "content": json_content(schema_ref("BookRequest"))
    });

    json!({
        "paths": {
            "/": {
                "get": book_list_op("List all books", vec![]),
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": request_body,
                    "responses": {
                        "201": { "description": "Created", "content": json_content(schema_ref("Book")) },
                        "400": error_response("Validation failed"),
                        "409": error_response("ISBN already exists")
                    }
                }
            },
            "/{id}": {
                "get": single_book_op("Get a book by id", vec![id_param()]),
                "put": {
                    "summary": "Replace a book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "requestBody": request_body,
                    "responses": {
                        "200": { "description": "Updated", "content": json_content(schema_ref("Book")) },
                        "400": error_response("Validation failed"),
                        "404": error_response("Book not found"),
                        "409": error_response("ISBN already exists")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": error_response("Book not found")
                    }
                }
            },
            "/{id}/stock": {
                "patch": single_book_op(
                    "Set the stock of a book",
                    vec![id_param(), query_param("stock", true, json!({ "type": "integer" }))],
                )
            },
            "/isbn/{isbn}": {
                "get": single_book_op("Get a book by ISBN", vec![path_param("isbn", string_schema())])
            },
            "/exists/{isbn}": {
                "get": {
                    "summary": "Check whether an ISBN is taken",
                    "tags": ["Books"],
                    "parameters": [path_param("isbn", string_schema())],
                    "responses": {
                        "200": { "description": "Existence flag", "content": json_content(json!({ "type": "boolean" })) }
                    }
                }
            },
            "/author/{author}": {
                "get": book_list_op("Books by author substring", vec![path_param("author", string_schema())])
            },
            "/title/{title}": {
                "get": book_list_op("Books by title substring", vec![path_param("title", string_schema())])
            },
            "/category/{category}": {
                "get": book_list_op(
                    "Books in a category",
                    vec![path_param("category", schema_ref("BookCategory"))],
                )
            },
            "/in-stock": { "get": book_list_op("Books with stock above zero", vec![]) },
            "/out-of-stock": { "get": book_list_op("Books with zero stock", vec![]) },
            "/low-stock": { "get": book_list_op("Books with stock below ten", vec![]) },
            "/price-range": {
                "get": book_list_op(
                    "Books priced within an inclusive range",
                    vec![
                        query_param("minPrice", true, number_schema()),
                        query_param("maxPrice", true, number_schema()),
                    ],
                )
            },
            "/max-price/{maxPrice}": {
                "get": book_list_op("Books at or below a price", vec![path_param("maxPrice", number_schema())])
            },
            "/min-price/{minPrice}": {
                "get": book_list_op("Books at or above a price", vec![path_param("minPrice", number_schema())])
            },
            "/search": {
                "get": book_list_op(
                    "Search titles and authors",
                    vec![query_param("q", true, string_schema())],
                )
            },
            "/filter": {
                "get": book_list_op(
                    "Author combined with a category or title",
                    vec![
                        query_param("author", true, string_schema()),
                        query_param("category", false, schema_ref("BookCategory")),
                        query_param("title", false, string_schema()),
                    ],
                )
            },
            "/sorted/{order}": {
                "get": book_list_op(
                    "All books in a fixed order",
                    vec![path_param(
                        "order",
                        json!({ "type": "string", "enum": ["price-asc", "price-desc", "title", "author"] }),
                    )],
                )
            },
            "/statistics/category": {
                "get": {
                    "summary": "Book count per category",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "[category, count] pairs",
                            "content": json_content(json!({ "type": "array", "items": { "type": "array" } }))
                        }
                    }
                }
            },
            "/statistics/average-price": {
                "get": {
                    "summary": "Average price per category",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "[category, average] pairs",
                            "content": json_content(json!({ "type": "array", "items": { "type": "array" } }))
                        }
                    }
                }
            },
            "/categories": {
                "get": {
                    "summary": "All category labels",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Category labels",
                            "content": json_content(json!({ "type": "array", "items": schema_ref("BookCategory") }))
                        }
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": { "description": "OK", "content": { "text/plain": { "schema": string_schema() } } }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "BookCategory": {
                    "type": "string",
                    "enum": BookCategory::ALL.iter().map(|c| c.label()).collect::<Vec<_>>()
                },
                "BookRequest": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1, "maxLength": 255 },
                        "author": { "type": "string", "minLength": 1, "maxLength": 255 },
                        "isbn": { "type": "string", "pattern": "^(?:\\d{10}|\\d{13})$" },
                        "description": { "type": "string", "maxLength": 1000 },
                        "price": { "type": "number", "minimum": 0.01, "maximum": 9999.99 },
                        "stock": { "type": "integer", "minimum": 0, "maximum": 999999 },
                        "category": schema_ref("BookCategory")
                    },
                    "required": ["title", "author", "isbn", "price", "stock", "category"]
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": string_schema(),
                        "author": string_schema(),
                        "isbn": string_schema(),
                        "description": { "type": "string", "nullable": true },
                        "price": number_schema(),
                        "stock": { "type": "integer" },
                        "category": schema_ref("BookCategory"),
                        "createdAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "title", "author", "isbn", "price", "stock", "category", "createdAt", "updatedAt"]
                }
            }
        }
    })
}
