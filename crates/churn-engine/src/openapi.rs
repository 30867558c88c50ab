//! OpenAPI document for the deployment API.

use serde_json::{Value, json};

use crate::codec::LABELS;
use crate::deployment::{DEPLOYMENT_ID, SCORING_PATH};
use crate::version::ENGINE_VERSION;

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "example": DEPLOYMENT_ID }
    })
}

/// Build the OpenAPI 3 document served at `/openapi.json`.
pub fn document() -> Value {
    let not_found = json_response("Deployment not found", schema_ref("HTTPError"));

    json!({
        "openapi": "3.0.2",
        "info": {
            "title": "Churn Custom ML Engine",
            "version": ENGINE_VERSION
        },
        "paths": {
            "/v1/deployments": {
                "get": {
                    "summary": "List Deployments",
                    "operationId": "list_deployments",
                    "responses": {
                        "200": json_response("Successful Response", schema_ref("DeploymentList"))
                    }
                }
            },
            "/v1/deployments/{id}": {
                "get": {
                    "summary": "Get Deployment",
                    "operationId": "get_deployment",
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("Successful Response", schema_ref("DeploymentDetail")),
                        "404": not_found
                    }
                }
            },
            SCORING_PATH: {
                "post": {
                    "summary": "Score",
                    "operationId": "score",
                    "parameters": [id_parameter()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": { "schema": schema_ref("ScoringRequest") }
                        }
                    },
                    "responses": {
                        "200": json_response("Successful Response", schema_ref("ScoringResponse")),
                        "404": not_found,
                        "422": json_response("Validation Error", schema_ref("HTTPValidationError")),
                        "500": json_response("Prediction Error", schema_ref("HTTPError"))
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "InputData": {
                    "type": "object",
                    "required": ["fields", "values"],
                    "properties": {
                        "fields": { "type": "array", "items": { "type": "string" } },
                        "values": {
                            "type": "array",
                            "items": { "type": "array", "items": schema_ref("Scalar") }
                        }
                    }
                },
                "Scalar": {
                    "nullable": true,
                    "anyOf": [
                        { "type": "string" },
                        { "type": "number" },
                        { "type": "boolean" },
                        {
                            "type": "array",
                            "items": { "type": "number" },
                            "minItems": 1,
                            "maxItems": 1
                        }
                    ]
                },
                "ScoringRequest": {
                    "type": "object",
                    "required": ["input_data"],
                    "properties": {
                        "input_data": {
                            "type": "array",
                            "minItems": 1,
                            "items": schema_ref("InputData")
                        }
                    }
                },
                "Prediction": {
                    "type": "object",
                    "required": ["fields", "labels", "values"],
                    "properties": {
                        "fields": { "type": "array", "items": { "type": "string" } },
                        "labels": {
                            "type": "array",
                            "items": { "type": "string", "enum": LABELS }
                        },
                        "values": { "type": "array", "items": { "type": "array", "items": {} } }
                    }
                },
                "ScoringResponse": {
                    "type": "object",
                    "required": ["predictions"],
                    "properties": {
                        "predictions": { "type": "array", "items": schema_ref("Prediction") }
                    }
                },
                "DeploymentInfo": {
                    "type": "object",
                    "required": ["id", "name", "scoring_endpoint"],
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "scoring_endpoint": { "type": "string" }
                    }
                },
                "DeploymentDetail": {
                    "type": "object",
                    "required": ["id", "name", "description", "model_type", "scoring_endpoint"],
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "description": { "type": "string" },
                        "model_type": { "type": "string" },
                        "scoring_endpoint": { "type": "string" }
                    }
                },
                "DeploymentList": {
                    "type": "object",
                    "required": ["deployments"],
                    "properties": {
                        "deployments": { "type": "array", "items": schema_ref("DeploymentInfo") }
                    }
                },
                "HTTPError": {
                    "type": "object",
                    "properties": { "detail": { "type": "string" } }
                },
                "ValidationError": {
                    "type": "object",
                    "required": ["loc", "msg", "type"],
                    "properties": {
                        "loc": {
                            "type": "array",
                            "items": { "anyOf": [{ "type": "string" }, { "type": "integer" }] }
                        },
                        "msg": { "type": "string" },
                        "type": { "type": "string" }
                    }
                },
                "HTTPValidationError": {
                    "type": "object",
                    "properties": {
                        "detail": { "type": "array", "items": schema_ref("ValidationError") }
                    }
                }
            }
        }
    })
}
